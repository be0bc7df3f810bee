use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::party::Party;
use crate::errors::AppError;
use crate::state::AppState;

use super::{LanguageParams, ProductRefRequest, ProductResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePartyRequest {
    pub owner_id: Uuid,
    pub table_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinPartyRequest {
    pub code: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeavePartyRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinPartyResponse {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeavePartyResponse {
    pub left: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PartyResponse {
    pub party_id: Uuid,
    pub code: String,
    pub table_id: i32,
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
    pub cart: Vec<Uuid>,
}

impl From<Party> for PartyResponse {
    fn from(party: Party) -> Self {
        Self {
            party_id: party.party_id,
            code: party.code,
            table_id: party.table_id,
            owner_id: party.owner_id,
            member_ids: party.member_ids,
            cart: party.cart,
        }
    }
}

/// POST /party
///
/// Opens a party on a table and hands back its join code.
#[utoipa::path(
    post,
    path = "/party",
    request_body = CreatePartyRequest,
    responses(
        (status = 201, description = "Party created", body = PartyResponse),
        (status = 409, description = "Table already has a party"),
    ),
    tag = "party"
)]
pub async fn create_party(
    state: web::Data<AppState>,
    body: web::Json<CreatePartyRequest>,
) -> Result<HttpResponse, AppError> {
    let CreatePartyRequest { owner_id, table_id } = body.into_inner();
    let party = web::block(move || state.parties.create_party(owner_id, table_id)).await??;
    Ok(HttpResponse::Created().json(PartyResponse::from(party)))
}

#[utoipa::path(
    post,
    path = "/party/join",
    request_body = JoinPartyRequest,
    responses(
        (status = 200, description = "Joined", body = JoinPartyResponse),
        (status = 404, description = "Unknown join code"),
        (status = 409, description = "Already a member"),
    ),
    tag = "party"
)]
pub async fn join_party(
    state: web::Data<AppState>,
    body: web::Json<JoinPartyRequest>,
) -> Result<HttpResponse, AppError> {
    let JoinPartyRequest { code, user_id } = body.into_inner();
    let code = web::block(move || state.parties.join_party(&code, user_id)).await??;
    Ok(HttpResponse::Ok().json(JoinPartyResponse { code }))
}

/// POST /party/{party_id}/leave
///
/// Leaving a party one is not in is answered with `left: false`, not an error.
#[utoipa::path(
    post,
    path = "/party/{party_id}/leave",
    params(("party_id" = Uuid, Path, description = "Party UUID")),
    request_body = LeavePartyRequest,
    responses((status = 200, description = "Leave outcome", body = LeavePartyResponse)),
    tag = "party"
)]
pub async fn leave_party(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<LeavePartyRequest>,
) -> Result<HttpResponse, AppError> {
    let party_id = path.into_inner();
    let user_id = body.into_inner().user_id;
    let left = web::block(move || state.parties.leave_party(party_id, user_id)).await??;
    Ok(HttpResponse::Ok().json(LeavePartyResponse { left }))
}

#[utoipa::path(
    get,
    path = "/party/{party_id}",
    params(("party_id" = Uuid, Path, description = "Party UUID")),
    responses(
        (status = 200, description = "Party with its shared cart", body = PartyResponse),
        (status = 404, description = "Party not found"),
    ),
    tag = "party"
)]
pub async fn get_party(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let party_id = path.into_inner();
    let party = web::block(move || state.parties.get_party(party_id))
        .await??
        .ok_or(DomainError::PartyNotFound)?;
    Ok(HttpResponse::Ok().json(PartyResponse::from(party)))
}

#[utoipa::path(
    get,
    path = "/party/{party_id}/cart",
    params(
        ("party_id" = Uuid, Path, description = "Party UUID"),
        ("lang" = Option<String>, Query, description = "Display language, defaults to en"),
    ),
    responses((status = 200, description = "Shared cart contents", body = [ProductResponse])),
    tag = "party"
)]
pub async fn get_party_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<LanguageParams>,
) -> Result<HttpResponse, AppError> {
    let party_id = path.into_inner();
    let lang = query.into_inner().lang;
    let products = web::block(move || state.parties.get_party_cart(party_id)).await??;
    let body: Vec<ProductResponse> = products
        .iter()
        .map(|p| ProductResponse::new(p, &lang))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/party/{party_id}/cart",
    params(("party_id" = Uuid, Path, description = "Party UUID")),
    request_body = ProductRefRequest,
    responses(
        (status = 204, description = "Product added"),
        (status = 404, description = "Party not found"),
    ),
    tag = "party"
)]
pub async fn add_to_party_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProductRefRequest>,
) -> Result<HttpResponse, AppError> {
    let party_id = path.into_inner();
    let product_id = body.into_inner().product_id;
    web::block(move || state.parties.add_product_to_party_cart(party_id, product_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/party/{party_id}/cart/{product_id}",
    params(
        ("party_id" = Uuid, Path, description = "Party UUID"),
        ("product_id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 204, description = "One occurrence removed"),
        (status = 404, description = "Party or its cart not found"),
    ),
    tag = "party"
)]
pub async fn remove_from_party_cart(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (party_id, product_id) = path.into_inner();
    web::block(move || {
        state
            .parties
            .remove_product_from_party_cart(party_id, product_id)
    })
    .await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/party/{party_id}/cart",
    params(("party_id" = Uuid, Path, description = "Party UUID")),
    responses((status = 204, description = "Shared cart emptied")),
    tag = "party"
)]
pub async fn clear_party_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let party_id = path.into_inner();
    web::block(move || state.parties.clear_party_cart(party_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
