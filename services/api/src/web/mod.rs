//! services/api/src/web/mod.rs
//!
//! The HTTP surface: handler modules, shared state, auth middleware, and the
//! master definition for the OpenAPI specification.

pub mod accounts;
pub mod auth;
pub mod comments;
pub mod content;
pub mod middleware;
pub mod state;
pub mod types;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        auth::update_me_handler,
        auth::my_bookmarks_handler,
        accounts::profile_handler,
        accounts::follow_handler,
        content::create_content_handler,
        content::list_content_handler,
        content::get_content_handler,
        content::update_content_handler,
        content::delete_content_handler,
        content::like_content_handler,
        content::bookmark_content_handler,
        content::list_categories_handler,
        content::create_category_handler,
        comments::create_comment_handler,
        comments::update_comment_handler,
        comments::delete_comment_handler,
        comments::like_comment_handler,
        comments::list_comments_handler,
        comments::list_replies_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::SessionResponse,
            auth::UpdateProfileRequest,
            accounts::ProfileResponse,
            content::CreateContentRequest,
            content::UpdateContentRequest,
            content::CreateCategoryRequest,
            comments::CreateCommentRequest,
            comments::UpdateCommentRequest,
            types::AccountResponse,
            types::CategoryResponse,
            types::ContentResponse,
            types::ContentPageResponse,
            types::PaginationMeta,
            types::CommentResponse,
            types::OwnCommentResponse,
            types::LikeResponse,
            types::BookmarkResponse,
            types::FollowResponse,
            crate::error::ErrorBody,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Publishing Engine API", description = "Content authoring, search, and social interaction endpoints.")
    )
)]
pub struct ApiDoc;
