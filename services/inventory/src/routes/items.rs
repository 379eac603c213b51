//! Item catalogue management

use axum::{
    Json,
    extract::{Form, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

use super::{ALL_ITEMS, DeleteRequest, flash_rejection, found, parse_id, redirect_with_flash};
use crate::{
    error::AppResult,
    models::{ItemCandidate, ItemId, UserId},
    services::AssignError,
    session::{self, FlashLevel},
    state::AppState,
    views,
};

/// Fields shared by the add and edit forms
#[derive(Debug, Default, Deserialize)]
pub struct ItemForm {
    item_id: Option<String>,
    name: Option<String>,
    serial_number: Option<String>,
    bill_number: Option<String>,
    date_of_purchase: Option<String>,
    warranty: Option<String>,
    assigned_to_id: Option<String>,
}

impl ItemForm {
    fn candidate(&self) -> ItemCandidate {
        ItemCandidate {
            name: self.name.clone(),
            serial_number: self.serial_number.clone(),
            bill_number: self.bill_number.clone(),
            date_of_purchase: self.date_of_purchase.clone(),
            warranty: self.warranty.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignForm {
    item_id: Option<String>,
    assigned_to: Option<String>,
}

fn back(jar: PrivateCookieJar) -> Response {
    (jar, found(ALL_ITEMS)).into_response()
}

/// Every item with its holder, plus the employees it can go to
pub async fn all_items(State(state): State<AppState>, jar: PrivateCookieJar) -> AppResult<Response> {
    let employees = state.directory.list().await?;
    let by_id: HashMap<UserId, _> = employees.iter().map(|u| (u.id, u.clone())).collect();

    let catalogue: Vec<_> = state
        .registry
        .list_all()
        .await?
        .into_iter()
        .map(|item| {
            let holder = item.assigned_to.and_then(|id| by_id.get(&id).cloned());
            (item, holder)
        })
        .collect();
    info!("All items accessed");

    let (jar, flashes) = session::take_flashes(jar);
    Ok((jar, views::all_items(&catalogue, &employees, &flashes)).into_response())
}

pub async fn add_item(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<ItemForm>,
) -> AppResult<Response> {
    let id = match state.registry.add(form.candidate()).await {
        Ok(id) => id,
        Err(e) => return Ok(back(flash_rejection(jar, e)?)),
    };
    let jar = session::flash(jar, FlashLevel::Success, "Item Added Successfully");

    // an optional holder picked on the add form
    let jar = match form.assigned_to_id.as_deref().map(str::trim) {
        None | Some("") => jar,
        Some(raw) => match raw.parse() {
            Ok(user_id) => match state.assignments.assign(id, UserId(user_id)).await {
                Ok(()) => jar,
                Err(e) => flash_rejection(jar, e)?,
            },
            Err(_) => {
                warn!("Add item: ignoring malformed assignee {}", raw);
                session::flash(jar, FlashLevel::Error, "User not found")
            }
        },
    };

    Ok(back(jar))
}

pub async fn assign_item(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<AssignForm>,
) -> AppResult<Response> {
    let Some(item_id) = parse_id(form.item_id.as_deref()) else {
        warn!("Assign item failed: missing or malformed item id");
        return Ok(redirect_with_flash(jar, FlashLevel::Error, "Item not found", ALL_ITEMS));
    };

    // no holder chosen
    let Some(user_id) = parse_id(form.assigned_to.as_deref()) else {
        return Ok(back(jar));
    };

    match state.assignments.assign(ItemId(item_id), UserId(user_id)).await {
        Ok(()) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Item assigned successfully",
            ALL_ITEMS,
        )),
        Err(e) => Ok(back(flash_rejection(jar, e)?)),
    }
}

pub async fn unassign_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    jar: PrivateCookieJar,
) -> AppResult<Response> {
    match state.assignments.unassign(ItemId(item_id)).await {
        Ok(()) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Item Unassigned successfully",
            ALL_ITEMS,
        )),
        Err(AssignError::ItemNotFound(_)) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Error,
            "Item Not Found",
            ALL_ITEMS,
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_item(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(request): Json<DeleteRequest>,
) -> AppResult<Response> {
    let Some(id) = request.id() else {
        warn!("Delete item failed: missing or malformed id");
        return Ok(redirect_with_flash(jar, FlashLevel::Error, "Item not found", ALL_ITEMS));
    };

    match state.registry.delete(ItemId(id)).await {
        Ok(()) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Item Deleted Successfully",
            ALL_ITEMS,
        )),
        Err(e) => Ok(back(flash_rejection(jar, e)?)),
    }
}

pub async fn edit_item(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<ItemForm>,
) -> AppResult<Response> {
    let Some(id) = parse_id(form.item_id.as_deref()) else {
        warn!("Update item failed: missing or malformed item id");
        return Ok(redirect_with_flash(jar, FlashLevel::Error, "Item not found", ALL_ITEMS));
    };

    match state.registry.update(ItemId(id), form.candidate()).await {
        Ok(()) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Item updated successfully",
            ALL_ITEMS,
        )),
        Err(e) => Ok(back(flash_rejection(jar, e)?)),
    }
}
