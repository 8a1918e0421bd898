//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all record kinds
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tracking REST API",
        version = "0.1.0",
        description = "Page views, user actions and goal conversions stored in MongoDB",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/views", api = domain_tracking::ApiDoc, tags = ["Views"]),
        (path = "/api/actions", api = domain_tracking::ApiDoc, tags = ["Actions"]),
        (path = "/api/goals", api = domain_tracking::ApiDoc, tags = ["Goals"]),
        (path = "/api/goals", api = domain_tracking::GoalDetailsApiDoc, tags = ["Goals"])
    ),
    tags(
        (name = "Views", description = "Page view tracking"),
        (name = "Actions", description = "User action tracking"),
        (name = "Goals", description = "Goal conversions and visitor journeys")
    )
)]
pub struct ApiDoc;
