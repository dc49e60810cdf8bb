//! 用户 HTTP 处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use super::model::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, User, UserFilter};
use super::service::UserService;
use crate::common::error::AppError;
use crate::common::extract::{AppJson, AppQuery};
use crate::common::pagination::PageRequest;
use crate::common::response::ApiResponse;

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid user ID format".to_string()))
}

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let page = PageRequest::from_query(
        query.page.as_deref(),
        query.limit.as_deref(),
        state.user_service.pagination_config(),
    );
    let filter = UserFilter { name: query.name };

    let listing = state.user_service.list_users(page, filter).await?;
    Ok(Json(ApiResponse::paginated(
        listing.users,
        listing.pagination,
        "Users retrieved successfully",
    )))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.user_service.get_user_by_id(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(user, "User retrieved successfully")))
}

pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let user = state.user_service.create_user(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user, "User created successfully")),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state
        .user_service
        .update_user(parse_id(&id)?, payload)
        .await?;
    Ok(Json(ApiResponse::success(user, "User updated successfully")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.user_service.delete_user(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(user, "User deleted successfully")))
}
