//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    Select,
};

use postboard_core::domain::{NewUser, Post, PostQuery, User};
use postboard_core::error::RepoError;
use postboard_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let active_model: user::ActiveModel = new_user.into();
        let model = active_model.insert(self.conn()).await.map_err(map_db_err)?;

        Ok(model.into())
    }
}

/// Postgres binds LIMIT/OFFSET as BIGINT.
const MAX_SLICE_BOUND: u64 = i64::MAX as u64;

/// Build the listing query.
///
/// A predicate is only added for each filter that is present; SeaORM joins
/// successive filters with AND. Ordering is applied before offset/limit.
pub(crate) fn list_query(query: &PostQuery) -> Select<PostEntity> {
    PostEntity::find()
        .apply_if(query.search_pattern(), |select, pattern| {
            select.filter(
                Expr::col((PostEntity, post::Column::Content))
                    .ilike(LikeExpr::new(pattern).escape('\\')),
            )
        })
        .apply_if(query.author_id, |select, author_id| {
            select.filter(post::Column::UserId.eq(author_id))
        })
        .order_by_desc(post::Column::Timestamp)
        .offset(query.offset.min(MAX_SLICE_BOUND))
        .limit(query.limit.min(MAX_SLICE_BOUND))
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_all(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        tracing::debug!(
            limit = query.limit,
            offset = query.offset,
            search = ?query.search,
            author_id = ?query.author_id,
            "Listing posts"
        );

        let result = list_query(query)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let active_model: post::ActiveModel = post.into();
        let model = active_model.insert(self.conn()).await.map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let active_model: post::ActiveModel = post.into();
        let model = active_model.update(self.conn()).await.map_err(map_db_err)?;

        Ok(model.into())
    }
}
