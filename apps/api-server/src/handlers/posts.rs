//! Post handlers.

use actix_web::{HttpResponse, web};

use postboard_core::domain::{NewPost, Post, PostPatch};
use postboard_shared::dto::{CreatePostRequest, ListPostsQuery, PostResponse, UpdatePostRequest};
use postboard_shared::{DeletedResponse, Paginated, Pagination};

use crate::middleware::auth::{Identity, OwnedPost};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Public view of a post; the author reference is dropped here.
fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        content: post.content,
        timestamp: post.timestamp,
    }
}

/// GET /posts?limit=&offset=&search=&username=
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    query
        .validate()
        .map_err(|errors| AppError::BadRequest(errors.join("; ")))?;

    let ListPostsQuery {
        limit,
        offset,
        search,
        username,
    } = query.into_inner();

    let author_id = match username.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => {
            let user = state.users.find_by_username(name).await?.ok_or_else(|| {
                AppError::NotFound(format!("User with username {} not found", name))
            })?;
            Some(user.id)
        }
        None => None,
    };

    let posts = state
        .posts
        .find_all(limit, offset, search.clone(), author_id)
        .await?;

    Ok(HttpResponse::Ok().json(Paginated {
        filter: username,
        search,
        pagination: Pagination { limit, offset },
        data: posts.into_iter().map(to_response).collect(),
    }))
}

/// GET /posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_one(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post with ID {} not found", id)))?;

    Ok(HttpResponse::Ok().json(to_response(post)))
}

/// POST /posts - the author is always the caller.
pub async fn create_post(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::Validation)?;

    let post = state
        .posts
        .create(
            NewPost {
                content: req.content,
            },
            identity.user_id,
        )
        .await?;

    tracing::info!(
        post_id = %post.id,
        user_id = identity.user_id,
        username = %identity.username,
        "Post created"
    );

    Ok(HttpResponse::Created().json(to_response(post)))
}

/// PATCH /posts/{id} - author only.
pub async fn update_post(
    owned: OwnedPost,
    state: web::Data<AppState>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::Validation)?;

    let id = owned.post.id;
    let post = state
        .posts
        .update(
            &id,
            PostPatch {
                content: req.content,
            },
        )
        .await?
        // Removed after the ownership check loaded it
        .ok_or_else(|| AppError::NotFound(format!("Post with ID {} not found", id)))?;

    Ok(HttpResponse::Ok().json(to_response(post)))
}

/// DELETE /posts/{id} - author only.
pub async fn delete_post(owned: OwnedPost, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let removed = state.posts.remove(&owned.post.id).await?;

    if removed.is_none() {
        tracing::debug!(post_id = %owned.post.id, "Post already gone at delete time");
    } else {
        tracing::info!(
            post_id = %owned.post.id,
            user_id = owned.identity.user_id,
            "Post deleted"
        );
    }

    Ok(HttpResponse::Ok().json(DeletedResponse::post()))
}
