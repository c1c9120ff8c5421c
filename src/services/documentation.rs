use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the stage scoring backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::events_stream,
        crate::routes::activity::activity_log,
        crate::routes::sessions::open_session,
        crate::routes::sessions::get_board,
        crate::routes::sessions::close_session,
        crate::routes::sessions::set_field,
        crate::routes::sessions::discard_edits,
        crate::routes::sessions::auto_rank,
        crate::routes::sessions::save_team,
        crate::routes::sessions::save_dirty,
        crate::routes::sessions::start_reset,
        crate::routes::sessions::reset_progress,
    ),
    components(
        schemas(
            crate::scoring::team::Scope,
            crate::dto::health::HealthResponse,
            crate::dto::activity::ActivityEntryDto,
            crate::dto::session::OpenSessionRequest,
            crate::dto::session::SessionSummary,
            crate::dto::session::BoardRowDto,
            crate::dto::session::BoardResponse,
            crate::dto::scoring::FieldUpdate,
            crate::dto::scoring::AutoRankResponse,
            crate::dto::scoring::SaveTeamResponse,
            crate::dto::scoring::BatchOutcomeDto,
            crate::dto::scoring::BatchSummaryDto,
            crate::dto::scoring::ResetRequest,
            crate::dto::scoring::ResetStartedResponse,
            crate::dto::scoring::ResetProgressDto,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::ResetProgressEvent,
            crate::dto::sse::BatchSavedEvent,
            crate::dto::sse::ActivityLoggedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "sessions", description = "Scoring sessions, edits, saves and resets"),
        (name = "activity", description = "Recently saved scores"),
    )
)]
pub struct ApiDoc;
