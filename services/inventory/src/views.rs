//! HTML pages

use axum::response::Html;
use std::fmt::Write;

use crate::models::{Item, User};
use crate::session::{Flash, FlashLevel};
use crate::validation::DATE_FORMAT;

/// Escape text for use in element content and quoted attributes
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

enum Nav {
    Public,
    Employee,
    Admin,
}

fn nav(kind: Nav) -> &'static str {
    match kind {
        Nav::Public => r#"<a href="/">Home</a> <a href="/login">Login</a> <a href="/register">Register</a>"#,
        Nav::Employee => {
            r#"<a href="/employee_dashboard">Dashboard</a> <a href="/assigned_item">My items</a> <a href="/profile">Profile</a> <a href="/logout">Logout</a>"#
        }
        Nav::Admin => {
            r#"<a href="/admin_dashboard">Dashboard</a> <a href="/admin_dashboard/all_users">Employees</a> <a href="/admin_dashboard/all_items">Items</a> <a href="/admin_dashboard/admin_profile">Profile</a> <a href="/logout">Logout</a>"#
        }
    }
}

fn flash_list(flashes: &[Flash]) -> String {
    if flashes.is_empty() {
        return String::new();
    }

    let mut out = String::from(r#"<ul class="flashes">"#);
    for flash in flashes {
        let class = match flash.level {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        };
        let _ = write!(out, r#"<li class="{class}">{}</li>"#, escape(&flash.message));
    }
    out.push_str("</ul>");
    out
}

fn layout(title: &str, kind: Nav, flashes: &[Flash], body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav>{nav}</nav>
{flashes}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        nav = nav(kind),
        flashes = flash_list(flashes),
    ))
}

fn message_paragraph(message: Option<&str>) -> String {
    match message {
        Some(message) if !message.is_empty() => {
            format!(r#"<p class="message">{}</p>"#, escape(message))
        }
        _ => String::new(),
    }
}

fn user_details(user: &User) -> String {
    let dob = user
        .dob
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();

    format!(
        r#"<dl class="profile">
<dt>First name</dt><dd>{first}</dd>
<dt>Last name</dt><dd>{last}</dd>
<dt>Date of birth</dt><dd>{dob}</dd>
<dt>Phone number</dt><dd>{phone}</dd>
<dt>Email</dt><dd>{email}</dd>
<dt>Role</dt><dd>{role}</dd>
</dl>"#,
        first = escape(&user.first_name),
        last = escape(&user.last_name),
        phone = escape(&user.phone_no),
        email = escape(&user.email),
        role = user.role,
    )
}

fn item_cells(item: &Item) -> String {
    format!(
        "<td>{name}</td><td>{serial}</td><td>{bill}</td><td>{date}</td><td>{warranty}</td>",
        name = escape(&item.name),
        serial = escape(&item.serial_number),
        bill = escape(&item.bill_number),
        date = item.date_of_purchase.format(DATE_FORMAT),
        warranty = escape(item.warranty.as_deref().unwrap_or("")),
    )
}

const ITEM_HEADERS: &str = "<th>Name</th><th>Serial number</th><th>Bill number</th><th>Date of purchase</th><th>Warranty</th>";

fn delete_script(endpoint: &str) -> String {
    format!(
        r#"<script>
function deleteRecord(id) {{
  fetch("{endpoint}", {{
    method: "DELETE",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify({{ id: id }})
  }}).then(function () {{ window.location.reload(); }});
}}
</script>"#
    )
}

pub fn home(flashes: &[Flash]) -> Html<String> {
    layout(
        "Home",
        Nav::Public,
        flashes,
        r#"<h1>Inventory Management</h1>
<p>Track company assets and who holds them.</p>
<p><a href="/login">Login</a> or <a href="/register">register</a> to continue.</p>"#,
    )
}

pub fn register(message: Option<&str>, flashes: &[Flash]) -> Html<String> {
    let body = format!(
        r#"<h1>Register</h1>
{message}
<form method="post" action="/register">
<label>First name <input name="first-name"></label>
<label>Last name <input name="last-name"></label>
<label>Date of birth <input type="date" name="dob"></label>
<label>Phone <input name="phone"></label>
<label>Email <input type="email" name="email"></label>
<label>Role <select name="role"><option value="user">Employee</option></select></label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Register</button>
</form>"#,
        message = message_paragraph(message),
    );
    layout("Register", Nav::Public, flashes, &body)
}

pub fn login(message: Option<&str>, flashes: &[Flash]) -> Html<String> {
    let body = format!(
        r#"<h1>Login</h1>
{message}
<form method="post" action="/login">
<label>Email <input type="email" name="email"></label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Login</button>
</form>"#,
        message = message_paragraph(message),
    );
    layout("Login", Nav::Public, flashes, &body)
}

pub fn employee_dashboard(first_name: &str, flashes: &[Flash]) -> Html<String> {
    let body = format!("<h1>Welcome, {}</h1>", escape(first_name));
    layout("Employee Dashboard", Nav::Employee, flashes, &body)
}

pub fn assigned_items(user: &User, items: &[Item], flashes: &[Flash]) -> Html<String> {
    let mut body = format!("<h1>Items assigned to {}</h1>", escape(&user.full_name()));

    if items.is_empty() {
        body.push_str("<p>No items assigned.</p>");
    } else {
        let _ = write!(body, "<table><tr>{ITEM_HEADERS}</tr>");
        for item in items {
            let _ = write!(body, "<tr>{}</tr>", item_cells(item));
        }
        body.push_str("</table>");
    }

    layout("Assigned Items", Nav::Employee, flashes, &body)
}

pub fn profile(user: &User, flashes: &[Flash]) -> Html<String> {
    let body = format!("<h1>Profile</h1>\n{}", user_details(user));
    layout("Profile", Nav::Employee, flashes, &body)
}

pub fn admin_dashboard(first_name: &str, flashes: &[Flash]) -> Html<String> {
    let body = format!("<h1>Welcome, {}</h1>", escape(first_name));
    layout("Admin Dashboard", Nav::Admin, flashes, &body)
}

pub fn admin_profile(user: &User, flashes: &[Flash]) -> Html<String> {
    let body = format!("<h1>Admin Profile</h1>\n{}", user_details(user));
    layout("Admin Profile", Nav::Admin, flashes, &body)
}

/// Employee roster with each employee's items
pub fn all_users(roster: &[(User, Vec<Item>)], flashes: &[Flash]) -> Html<String> {
    let mut body = String::from(
        "<h1>Employees</h1>\n<table><tr><th>Name</th><th>Email</th><th>Phone</th><th>Role</th><th>Items</th><th></th></tr>",
    );

    for (user, items) in roster {
        let names = items
            .iter()
            .map(|item| escape(&item.name))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            body,
            r#"<tr><td>{name}</td><td>{email}</td><td>{phone}</td><td>{role}</td><td>{names}</td><td><button onclick="deleteRecord({id})">Delete</button></td></tr>"#,
            name = escape(&user.full_name()),
            email = escape(&user.email),
            phone = escape(&user.phone_no),
            role = user.role,
            id = user.id,
        );
    }
    body.push_str("</table>");

    body.push_str(
        r#"
<h2>Add employee</h2>
<form method="post" action="/add_user">
<label>First name <input name="first_name"></label>
<label>Last name <input name="last_name"></label>
<label>Date of birth <input type="date" name="dob"></label>
<label>Phone <input name="phone_no"></label>
<label>Email <input type="email" name="email"></label>
<label>Password <input type="password" name="password"></label>
<label>Role <select name="role"><option value="user">Employee</option><option value="admin">Admin</option></select></label>
<button type="submit">Add</button>
</form>
"#,
    );
    body.push_str(&delete_script("/delete_user"));

    layout("All Users", Nav::Admin, flashes, &body)
}

fn employee_options(employees: &[User], blank: bool) -> String {
    let mut out = String::new();
    if blank {
        out.push_str(r#"<option value="">Unassigned</option>"#);
    }
    for user in employees {
        let _ = write!(
            out,
            r#"<option value="{}">{}</option>"#,
            user.id,
            escape(&user.full_name())
        );
    }
    out
}

/// Item catalogue with holders and the management forms
pub fn all_items(
    catalogue: &[(Item, Option<User>)],
    employees: &[User],
    flashes: &[Flash],
) -> Html<String> {
    let mut body = format!(
        "<h1>Items</h1>\n<table><tr>{ITEM_HEADERS}<th>Assigned to</th><th></th><th></th></tr>"
    );

    for (item, holder) in catalogue {
        let holder_cell = match holder {
            Some(user) => format!(
                r#"{} <a href="/admin_dashboard/unassign_item/{}">Unassign</a>"#,
                escape(&user.full_name()),
                item.id
            ),
            None => format!(
                r#"<form method="post" action="/admin_dashboard/assign_item"><input type="hidden" name="item_id" value="{id}"><select name="assigned_to">{options}</select><button type="submit">Assign</button></form>"#,
                id = item.id,
                options = employee_options(employees, false),
            ),
        };

        let edit_form = format!(
            r#"<form method="post" action="/edit_item"><input type="hidden" name="item_id" value="{id}"><input name="name" value="{name}"><input name="serial_number" value="{serial}"><input name="bill_number" value="{bill}"><input type="date" name="date_of_purchase" value="{date}"><input name="warranty" value="{warranty}"><button type="submit">Save</button></form>"#,
            id = item.id,
            name = escape(&item.name),
            serial = escape(&item.serial_number),
            bill = escape(&item.bill_number),
            date = item.date_of_purchase.format(DATE_FORMAT),
            warranty = escape(item.warranty.as_deref().unwrap_or("")),
        );

        let _ = write!(
            body,
            r#"<tr>{cells}<td>{holder_cell}</td><td>{edit_form}</td><td><button onclick="deleteRecord({id})">Delete</button></td></tr>"#,
            cells = item_cells(item),
            id = item.id,
        );
    }
    body.push_str("</table>");

    let _ = write!(
        body,
        r#"
<h2>Add item</h2>
<form method="post" action="/admin_dashboard/add_item">
<label>Name <input name="name"></label>
<label>Serial number <input name="serial_number"></label>
<label>Bill number <input name="bill_number"></label>
<label>Date of purchase <input type="date" name="date_of_purchase"></label>
<label>Warranty <input name="warranty"></label>
<label>Assign to <select name="assigned_to_id">{options}</select></label>
<button type="submit">Add</button>
</form>
"#,
        options = employee_options(employees, true),
    );
    body.push_str(&delete_script("/delete_item"));

    layout("All Items", Nav::Admin, flashes, &body)
}

pub fn error_page(message: &str) -> Html<String> {
    let body = format!("<h1>Something went wrong</h1>\n<p>{}</p>", escape(message));
    layout("Error", Nav::Public, &[], &body)
}
