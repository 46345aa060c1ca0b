//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the auth
//! module and the repository layer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};

use super::dto::{
    CategoryResponse, CreateCategoryRequest, CreateLineRequest, CreateStopRequest,
    CreateUserRequest, DeleteCategoryResponse, DeleteLineResponse, DeleteStopResponse,
    DeleteUserResponse, HealthResponse, LineResponse, LoginRequest, StopResponse, TokenResponse,
    UpdateCategoryRequest, UpdateCategoryResponse, UpdateLineRequest, UpdateLineResponse,
    UpdateStopRequest, UpdateStopResponse, UpdateUserRequest, UpdateUserResponse, UserResponse,
    UserWithHashResponse,
};
use super::error::AppError;
use super::extract::CurrentUser;
use super::state::AppState;
use crate::auth::{self, hash_password};
use crate::models::{
    CategoryChanges, CategoryId, LineId, NewCategory, NewStop, NewTransportLine, StopChanges,
    StopId, TransportLineChanges, UserChanges, UserId,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for create handlers (201 + body).
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Authentication
// =============================================================================

/// POST /token
///
/// Exchange form credentials for a bearer access token.
pub async fn login(
    State(state): State<AppState>,
    Form(request): Form<LoginRequest>,
) -> HandlerResult<TokenResponse> {
    let user = auth::verify(
        state.repository.as_ref(),
        &request.username,
        &request.password,
    )
    .await?;

    let token = state.tokens.issue(&user.username)?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// GET /users/me
///
/// Return the user identified by the bearer token.
pub async fn read_users_me(CurrentUser(user): CurrentUser) -> HandlerResult<UserResponse> {
    Ok(Json(user.into()))
}

// =============================================================================
// Users
// =============================================================================

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> CreatedResult<UserResponse> {
    let user = auth::register(
        state.repository.as_ref(),
        &request.username,
        &request.email,
        &request.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> HandlerResult<UserResponse> {
    let user = state.repository.get_user(UserId::new(user_id)).await?;
    Ok(Json(user.into()))
}

/// PUT /update/users/{user_id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> HandlerResult<UpdateUserResponse> {
    let changes = UserChanges {
        username: request.username,
        email: request.email,
        hashed_password: request.password.as_deref().map(hash_password),
    };

    let user = state
        .repository
        .update_user(UserId::new(user_id), changes)
        .await?;

    Ok(Json(UpdateUserResponse {
        message: "User updated successfully".to_string(),
        user: user.into(),
    }))
}

/// DELETE /delete/users/{user_id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> HandlerResult<DeleteUserResponse> {
    let user = state.repository.delete_user(UserId::new(user_id)).await?;

    Ok(Json(DeleteUserResponse {
        message: "User deleted successfully".to_string(),
        user: user.into(),
    }))
}

/// GET /allusers
///
/// List every user. This listing exposes the stored password digest; it is
/// the only endpoint that does.
pub async fn list_users(
    State(state): State<AppState>,
) -> HandlerResult<Vec<UserWithHashResponse>> {
    let users = state.repository.list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

// =============================================================================
// Categories
// =============================================================================

/// POST /api/creat/category
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> CreatedResult<CategoryResponse> {
    let category = state
        .repository
        .create_category(NewCategory { name: request.name })
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// GET /api/category/{category_id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> HandlerResult<CategoryResponse> {
    let category = state
        .repository
        .get_category(CategoryId::new(category_id))
        .await?;
    Ok(Json(category.into()))
}

/// PUT /api/update/category/{category_id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> HandlerResult<UpdateCategoryResponse> {
    let category = state
        .repository
        .update_category(
            CategoryId::new(category_id),
            CategoryChanges { name: request.name },
        )
        .await?;

    Ok(Json(UpdateCategoryResponse {
        message: "Category updated successfully".to_string(),
        category: category.into(),
    }))
}

/// DELETE /api/delete/category/{category_id}
///
/// Deletes only the category itself; lines that reference it stay in place.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> HandlerResult<DeleteCategoryResponse> {
    let category = state
        .repository
        .delete_category(CategoryId::new(category_id))
        .await?;

    Ok(Json(DeleteCategoryResponse {
        message: "Category deleted successfully".to_string(),
        category: category.into(),
    }))
}

/// GET /api/allcategory
pub async fn list_categories(
    State(state): State<AppState>,
) -> HandlerResult<Vec<CategoryResponse>> {
    let categories = state.repository.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

// =============================================================================
// Transport lines
// =============================================================================

/// POST /api/creat/line
pub async fn create_line(
    State(state): State<AppState>,
    Json(request): Json<CreateLineRequest>,
) -> CreatedResult<LineResponse> {
    let line = state
        .repository
        .create_line(NewTransportLine {
            name: request.name,
            category_id: CategoryId::new(request.category_id),
            start_time: request.start_time,
            end_time: request.end_time,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(line.into())))
}

/// GET /api/line/{line_id}
pub async fn get_line(
    State(state): State<AppState>,
    Path(line_id): Path<i64>,
) -> HandlerResult<LineResponse> {
    let line = state.repository.get_line(LineId::new(line_id)).await?;
    Ok(Json(line.into()))
}

/// PUT /api/update/line/{line_id}
pub async fn update_line(
    State(state): State<AppState>,
    Path(line_id): Path<i64>,
    Json(request): Json<UpdateLineRequest>,
) -> HandlerResult<UpdateLineResponse> {
    let changes = TransportLineChanges {
        name: request.name.clone(),
        category_id: request.category_id_typed(),
        start_time: request.start_time,
        end_time: request.end_time,
    };

    let line = state
        .repository
        .update_line(LineId::new(line_id), changes)
        .await?;

    Ok(Json(UpdateLineResponse {
        message: "Line updated successfully".to_string(),
        line: line.into(),
    }))
}

/// DELETE /api/delete/line/{line_id}
///
/// Deletes only the line itself; its stops stay in place.
pub async fn delete_line(
    State(state): State<AppState>,
    Path(line_id): Path<i64>,
) -> HandlerResult<DeleteLineResponse> {
    let line = state.repository.delete_line(LineId::new(line_id)).await?;

    Ok(Json(DeleteLineResponse {
        message: "Line deleted successfully".to_string(),
        line: line.into(),
    }))
}

/// GET /api/allline
pub async fn list_lines(State(state): State<AppState>) -> HandlerResult<Vec<LineResponse>> {
    let lines = state.repository.list_lines().await?;
    Ok(Json(lines.into_iter().map(Into::into).collect()))
}

// =============================================================================
// Stops
// =============================================================================

/// POST /api/creat/stop
pub async fn create_stop(
    State(state): State<AppState>,
    Json(request): Json<CreateStopRequest>,
) -> CreatedResult<StopResponse> {
    let stop = state
        .repository
        .create_stop(NewStop {
            line_id: LineId::new(request.line_id),
            name: request.name,
            latitude: request.latitude,
            longitude: request.longitude,
            stop_order: request.stop_order,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(stop.into())))
}

/// GET /api/stop/{stop_id}
pub async fn get_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<i64>,
) -> HandlerResult<StopResponse> {
    let stop = state.repository.get_stop(StopId::new(stop_id)).await?;
    Ok(Json(stop.into()))
}

/// PUT /api/update/stop/{stop_id}
pub async fn update_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<i64>,
    Json(request): Json<UpdateStopRequest>,
) -> HandlerResult<UpdateStopResponse> {
    let changes = StopChanges {
        line_id: request.line_id_typed(),
        name: request.name.clone(),
        latitude: request.latitude,
        longitude: request.longitude,
        stop_order: request.stop_order,
    };

    let stop = state
        .repository
        .update_stop(StopId::new(stop_id), changes)
        .await?;

    Ok(Json(UpdateStopResponse {
        message: "Stop updated successfully".to_string(),
        stop: stop.into(),
    }))
}

/// DELETE /api/delete/stop/{stop_id}
pub async fn delete_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<i64>,
) -> HandlerResult<DeleteStopResponse> {
    let stop = state.repository.delete_stop(StopId::new(stop_id)).await?;

    Ok(Json(DeleteStopResponse {
        message: "Stop deleted successfully".to_string(),
        stop: stop.into(),
    }))
}

/// GET /api/allstop
pub async fn list_stops(State(state): State<AppState>) -> HandlerResult<Vec<StopResponse>> {
    let stops = state.repository.list_stops().await?;
    Ok(Json(stops.into_iter().map(Into::into).collect()))
}
