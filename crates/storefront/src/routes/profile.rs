//! Profile page: the customer's name and shipping addresses.
//!
//! These routes require authentication. Every write redirects back to the
//! profile with a toast.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aunclic_core::{AddressId, Locale};

use super::shell::Shell;
use crate::db::{AddressRepository, CustomerRepository, RepositoryError};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::flash::{self, Flash};
use crate::middleware::{CurrentLocale, RequireAuth};
use crate::models::{AddressInput, ShippingAddress, session_keys};
use crate::state::AppState;

/// Address display data for templates.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: AddressId,
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub update_url: String,
    pub delete_url: String,
}

impl AddressView {
    fn new(address: ShippingAddress, locale: Locale) -> Self {
        let base = addresses_url(locale);
        Self {
            id: address.id,
            update_url: format!("{base}/{}", address.id),
            delete_url: format!("{base}/{}/delete", address.id),
            recipient: address.recipient,
            street: address.street,
            city: address.city,
            province: address.province,
            postal_code: address.postal_code,
            country: address.country,
            phone: address.phone.unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "profile/index.html")]
pub struct ProfileTemplate {
    pub shell: Shell,
    pub name: String,
    pub email: String,
    pub member_since: String,
    pub addresses: Vec<AddressView>,
    pub name_url: String,
    pub add_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

fn profile_url(locale: Locale) -> String {
    format!("/{}/perfil", locale.code())
}

fn addresses_url(locale: Locale) -> String {
    format!("/{}/perfil/addresses", locale.code())
}

fn parse_address(id: &str) -> Result<AddressId, AppError> {
    id.parse()
        .map_err(|_| AppError::NotFound(format!("address {id}")))
}

/// Display the profile with addresses.
///
/// # Errors
///
/// Returns an error if the customer row cannot be loaded.
#[instrument(skip_all, fields(customer = %user.customer_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut shell: Shell,
) -> Result<impl IntoResponse, AppError> {
    let locale = shell.locale;
    let customers = CustomerRepository::new(state.pool());
    let addresses = AddressRepository::new(state.pool());

    let (customer, rows) = tokio::join!(
        customers.get_by_id(user.customer_id),
        addresses.list(user.customer_id),
    );
    let customer = customer?.ok_or(RepositoryError::NotFound)?;
    let addresses = rows.map_or_else(
        |e| {
            tracing::error!(error = %e, "Failed to load addresses");
            shell.toast(Flash::error("toast.loadError"));
            Vec::new()
        },
        |rows| rows.into_iter().map(|a| AddressView::new(a, locale)).collect(),
    );

    Ok(ProfileTemplate {
        name: customer.name.unwrap_or_default(),
        email: customer.email.into_inner(),
        member_since: customer.created_at.format("%Y-%m-%d").to_string(),
        addresses,
        name_url: format!("{}/name", profile_url(locale)),
        add_url: addresses_url(locale),
        shell: shell.with_title("profile.title"),
    })
}

/// Update the display name, here and in the session.
///
/// # Errors
///
/// Never fails: storage errors become a toast.
#[instrument(skip_all, fields(customer = %user.customer_id))]
pub async fn update_name(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    RequireAuth(mut user): RequireAuth,
    session: Session,
    Form(form): Form<NameForm>,
) -> Result<Redirect, AppError> {
    match CustomerRepository::new(state.pool())
        .update_name(user.customer_id, &form.name)
        .await
    {
        Ok(customer) => {
            user.name = customer.name;
            if let Err(e) = session.insert(session_keys::CURRENT_USER, &user).await {
                tracing::warn!(error = %e, "Failed to refresh session user");
            }
            flash::push(&session, Flash::success("profile.nameUpdated")).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to update name");
            flash::push(&session, Flash::error("profile.nameUpdateError")).await;
        }
    }
    Ok(Redirect::to(&profile_url(locale)))
}

/// Add a shipping address.
///
/// # Errors
///
/// Never fails: validation and storage errors become a toast.
#[instrument(skip_all, fields(customer = %user.customer_id))]
pub async fn add_address(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(input): Form<AddressInput>,
) -> Result<Redirect, AppError> {
    let result = match input.normalize() {
        Ok(input) => AddressRepository::new(state.pool())
            .add(user.customer_id, &input)
            .await
            .map_err(|e| tracing::error!(error = %e, "Failed to add address")),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected address");
            Err(())
        }
    };

    let toast = match result {
        Ok(address) => {
            let address_id = address.id.to_string();
            add_breadcrumb("profile", "Added address", &[("address_id", address_id.as_str())]);
            Flash::success("profile.addressAdded")
        }
        Err(()) => Flash::error("profile.addressAddError"),
    };
    flash::push(&session, toast).await;
    Ok(Redirect::to(&profile_url(locale)))
}

/// Replace an address.
///
/// # Errors
///
/// Returns `NotFound` for a malformed id; other failures become a toast.
#[instrument(skip_all, fields(customer = %user.customer_id, address = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<String>,
    Form(input): Form<AddressInput>,
) -> Result<Redirect, AppError> {
    let id = parse_address(&id)?;
    let result = match input.normalize() {
        Ok(input) => AddressRepository::new(state.pool())
            .update(user.customer_id, id, &input)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => tracing::warn!("Address not found for customer"),
                other => tracing::error!(error = %other, "Failed to update address"),
            }),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected address");
            Err(())
        }
    };

    let toast = if result.is_ok() {
        Flash::success("profile.addressUpdated")
    } else {
        Flash::error("profile.addressUpdateError")
    };
    flash::push(&session, toast).await;
    Ok(Redirect::to(&profile_url(locale)))
}

/// Delete an address.
///
/// # Errors
///
/// Returns `NotFound` for a malformed id; other failures become a toast.
#[instrument(skip_all, fields(customer = %user.customer_id, address = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_address(&id)?;
    let toast = match AddressRepository::new(state.pool())
        .delete(user.customer_id, id)
        .await
    {
        Ok(()) => Flash::success("profile.addressDeleted"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete address");
            Flash::error("profile.addressDeleteError")
        }
    };
    flash::push(&session, toast).await;
    Ok(Redirect::to(&profile_url(locale)))
}
