//! OpenAPI / Swagger UI documentation.
//!
//! - Swagger UI: `/docs`
//! - OpenAPI JSON: `/api-docs/openapi.json`

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::Modify;

use super::error::ErrorBody;
use super::types::{
    AuthCompleteResponse, BookmarkBody, BookmarkDeleteResponse, BookmarkInput, BookmarkResponse,
    ChallengePayload, ChallengeResponse, DeriveKeyRequest, DeriveKeyResponse, EditProfileRequest,
    HealthResponse, LoginCompleteRequest, LoginStartRequest, MeResponse, MessageResponse,
    MetaResponse, OneOrMany, PlayerStatusAck, PlayerStatusRequest, ProgressDeleteMeta,
    ProgressDeleteRequest, ProgressDeleteResponse, ProgressImportItem, ProgressResponse,
    ProgressUpdateRequest, RegisterCompleteRequest, RegisterStartRequest, RoomStatusesResponse,
    SessionIdResponse, SessionListEntry, SessionResponse, SettingsData, SettingsEnvelope,
    SettingsRequest, UpdateSessionRequest, UserDetailResponse, UserResponse,
    UserStatusesResponse,
};
use crate::db::{BookmarkMediaType, BookmarkMeta, ProgressMediaType, ProgressMeta, UserProfile};
use crate::player::{ContentInfo, PlayerState, PlayerStatus};

/// Bearer session-token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "screening_room API",
        version = "0.1.0",
        description = "Media-watching companion backend: passwordless Ed25519 challenge-response auth, device-bound sessions, user state sync, watch-party presence.",
        license(name = "MIT")
    ),
    paths(
        // Auth flows
        super::handlers::auth::register_start,
        super::handlers::auth::register_complete,
        super::handlers::auth::login_start,
        super::handlers::auth::login_complete,
        super::handlers::auth::derive_public_key,
        // Users and sessions
        super::handlers::users::me,
        super::handlers::users::edit_user,
        super::handlers::sessions::list_sessions,
        super::handlers::sessions::patch_session,
        super::handlers::sessions::delete_session,
        // Per-user state
        super::handlers::bookmarks::list_bookmarks,
        super::handlers::bookmarks::put_bookmarks,
        super::handlers::bookmarks::add_bookmark,
        super::handlers::bookmarks::delete_bookmark,
        super::handlers::progress::list_progress,
        super::handlers::progress::update_progress,
        super::handlers::progress::delete_progress,
        super::handlers::progress::import_progress,
        super::handlers::settings::get_settings,
        super::handlers::settings::update_settings,
        // Watch-party relay
        super::handlers::player::post_status,
        super::handlers::player::get_status,
        // System
        super::handlers::misc::index,
        super::handlers::misc::health,
        super::handlers::misc::meta,
    ),
    components(schemas(
        ErrorBody,
        RegisterStartRequest,
        RegisterCompleteRequest,
        LoginStartRequest,
        LoginCompleteRequest,
        DeriveKeyRequest,
        ChallengeResponse,
        ChallengePayload,
        AuthCompleteResponse,
        DeriveKeyResponse,
        UserResponse,
        UserDetailResponse,
        UserProfile,
        EditProfileRequest,
        SessionResponse,
        SessionListEntry,
        SessionIdResponse,
        UpdateSessionRequest,
        MeResponse,
        BookmarkMediaType,
        BookmarkMeta,
        BookmarkInput,
        BookmarkBody,
        OneOrMany,
        BookmarkResponse,
        BookmarkDeleteResponse,
        ProgressMediaType,
        ProgressMeta,
        ProgressUpdateRequest,
        ProgressImportItem,
        ProgressDeleteRequest,
        ProgressDeleteMeta,
        ProgressResponse,
        ProgressDeleteResponse,
        SettingsRequest,
        SettingsData,
        SettingsEnvelope,
        PlayerStatus,
        PlayerState,
        ContentInfo,
        PlayerStatusRequest,
        PlayerStatusAck,
        UserStatusesResponse,
        RoomStatusesResponse,
        MessageResponse,
        HealthResponse,
        MetaResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Challenge-response registration and login"),
        (name = "Users", description = "Profile and current-user queries"),
        (name = "Sessions", description = "Device session management"),
        (name = "Bookmarks", description = "Saved titles"),
        (name = "Progress", description = "Watch progress sync"),
        (name = "Settings", description = "Per-user application settings"),
        (name = "Player", description = "Watch-party presence relay"),
        (name = "System", description = "Health and server meta")
    )
)]
pub struct ApiDoc;
