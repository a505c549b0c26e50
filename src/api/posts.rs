//! Post API endpoints, including image upload.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::cache::{post_tag, TAG_POSTS};
use crate::errors::AppError;
use crate::models::{CreatePostRequest, Post, PostFilters, UpdatePostRequest};
use crate::AppState;

/// GET /api/posts - Public post list. Only published posts, cached.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(mut filters): Query<PostFilters>,
) -> ApiResult<Vec<Post>> {
    // The public surface never exposes drafts
    filters.published = Some(true);

    let repo = state.repo.clone();
    let posts = state
        .cache
        .posts(filters.cache_key(), || async move {
            repo.list_posts(&filters).await
        })
        .await?;

    success((*posts).clone())
}

/// GET /api/posts/:id - Get a single post, cached.
pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Post> {
    let repo = state.repo.clone();
    let lookup = id.clone();
    let post = state
        .cache
        .post(&id, || async move { repo.get_post(&lookup).await })
        .await?;

    success((*post).clone())
}

/// GET /api/categories - Distinct categories across published posts, cached.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let repo = state.repo.clone();
    let categories = state
        .cache
        .categories(|| async move { repo.list_categories().await })
        .await?;

    success((*categories).clone())
}

/// GET /api/admin/posts - Full post list for the dashboard, drafts included.
pub async fn admin_list_posts(
    State(state): State<AppState>,
    Query(filters): Query<PostFilters>,
) -> ApiResult<Vec<Post>> {
    success(state.repo.list_posts(&filters).await?)
}

/// POST /api/admin/posts - Create a new post.
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> ApiResult<Post> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.published {
        validate_publishable(
            &request.title,
            &request.excerpt,
            &request.content,
            &request.category,
        )?;
    }

    let post = state.repo.create_post(&request).await?;
    state.cache.invalidate(TAG_POSTS).await;
    success(post)
}

/// PUT /api/admin/posts/:id - Update a post.
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> ApiResult<Post> {
    // The invariant holds on the merged result: partial updates may not
    // leave a published post with empty required fields.
    let existing = state
        .repo
        .get_post(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    let published = request.published.unwrap_or(existing.published);
    if published {
        validate_publishable(
            request.title.as_deref().unwrap_or(&existing.title),
            request.excerpt.as_deref().unwrap_or(&existing.excerpt),
            request.content.as_deref().unwrap_or(&existing.content),
            request.category.as_deref().unwrap_or(&existing.category),
        )?;
    }

    let post = state.repo.update_post(&id, &request).await?;
    state.cache.invalidate(TAG_POSTS).await;
    state.cache.invalidate(&post_tag(&id)).await;
    success(post)
}

/// DELETE /api/admin/posts/:id - Delete a post and its stored image.
pub async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let post = state
        .repo
        .get_post(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    // Image cleanup must never block the post deletion
    if let Some(image_id) = &post.image_id {
        if let Err(e) = state.images.delete(image_id).await {
            tracing::warn!("Failed to delete image {} for post {}: {}", image_id, id, e);
        }
    }

    state.repo.delete_post(&id).await?;
    state.cache.invalidate(TAG_POSTS).await;
    state.cache.invalidate(&post_tag(&id)).await;
    success(())
}

/// Payload returned after a successful image upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub file_id: String,
    pub file_url: String,
}

/// POST /api/admin/images - Upload a post image (multipart field `file`).
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadedImage> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let file_id = state.images.save(file_name.as_deref(), &bytes).await?;
        let file_url = state.images.public_url(&file_id);
        return success(UploadedImage { file_id, file_url });
    }

    Err(AppError::Validation(
        "Missing multipart field 'file'".to_string(),
    ))
}

/// DELETE /api/admin/images/:id - Delete a stored image.
pub async fn delete_image(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.images.delete(&id).await?;
    success(())
}

/// A published post must have non-empty title, excerpt, content, and category.
fn validate_publishable(
    title: &str,
    excerpt: &str,
    content: &str,
    category: &str,
) -> Result<(), AppError> {
    let missing = [
        ("title", title),
        ("excerpt", excerpt),
        ("content", content),
        ("category", category),
    ]
    .iter()
    .find(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| *name);

    match missing {
        Some(field) => Err(AppError::Validation(format!(
            "A published post requires a non-empty {}",
            field
        ))),
        None => Ok(()),
    }
}
