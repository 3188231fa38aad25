use dotenv::dotenv;
use handlebars::Handlebars;
use log::*;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tide::{Request, Response, StatusCode};
use uuid::Uuid;

use std::env;
use std::sync::Arc;

mod api_models;
mod errors;
mod models;
mod store;
mod voting;

use crate::errors::AppError;

/**
 * Struct for carrying application state into tide request handlers
 */
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub templates: Arc<Handlebars<'static>>,
}

/**
 * Create the sqlx connection pool for postgresql
 */
async fn create_pool() -> Result<PgPool, sqlx::Error> {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
}

/**
 * Register the handlebars templates for the HTML pages
 */
fn load_templates() -> Result<Handlebars<'static>, handlebars::TemplateFileError> {
    let mut templates = Handlebars::new();
    templates.register_templates_directory(".hbs", "views")?;
    Ok(templates)
}

/**
 * Extract the authenticated user from the request, if present
 *
 * The fronting auth proxy validates the session and forwards the user's id
 * in the `x-auth-user` header; this service never sees credentials. No
 * header means an anonymous viewer.
 */
fn current_user(req: &Request<AppState>) -> Option<Uuid> {
    req.header("x-auth-user")
        .and_then(|header| Uuid::parse_str(header.last().as_str()).ok())
}

fn require_user(req: &Request<AppState>) -> Result<Uuid, AppError> {
    current_user(req).ok_or(AppError::Unauthenticated)
}

/**
 * Look up the `name` route parameter as a UUID
 */
fn param_uuid(req: &Request<AppState>, name: &str) -> Result<Uuid, tide::Error> {
    let raw = req.param::<String>(name)?;
    Uuid::parse_str(&raw)
        .map_err(|_| tide::Error::from_str(StatusCode::BadRequest, "Invalid uuid specified"))
}

/// Six character uppercased invite code for a new crew.
fn generate_join_code() -> String {
    Uuid::new_v4().to_simple().to_string()[..6].to_uppercase()
}

async fn ensure_member(db: &PgPool, crew_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    if store::is_member(db, crew_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden("crew members only"))
    }
}

/**
 * Render one of the registered templates into an HTML response
 */
fn render(
    state: &AppState,
    name: &str,
    data: &serde_json::Value,
) -> Result<Response, tide::Error> {
    let body = state
        .templates
        .render(name, data)
        .map_err(|err| tide::Error::from_str(StatusCode::InternalServerError, err.to_string()))?;

    let response = Response::builder(StatusCode::Ok)
        .content_type(tide::http::mime::HTML)
        .body(body)
        .build();
    Ok(response)
}

/**
 * The routes module contains all the tide routes and the logic to fulfill the
 * responses for each route.
 *
 * Modules are nested for cleaner organization here
 */
mod routes {
    /**
     * The server-rendered pages and their form posts
     */
    pub mod pages {
        use log::*;
        use serde_json::json;
        use tide::{Redirect, Request, Response};

        use crate::api_models::{BallotRequest, PackingItemRequest, RideshareForm, RideshareRole};
        use crate::errors::AppError;
        use crate::store::{self, PgVoteStore};
        use crate::voting::{CastOutcome, Choice, VotingSession};
        use crate::{current_user, ensure_member, param_uuid, render, require_user, AppState};

        /**
         * GET /
         */
        pub async fn index(req: Request<AppState>) -> Result<Response, tide::Error> {
            let viewer = current_user(&req);
            let crews = match viewer {
                Some(user) => store::crews_for_user(&req.state().db, user).await?,
                None => Vec::new(),
            };

            let data = json!({
                "signed_in": viewer.is_some(),
                "crews": crews,
            });
            render(req.state(), "index", &data)
        }

        /**
         * GET /crew/:id
         */
        pub async fn crew(req: Request<AppState>) -> Result<Response, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let db = &req.state().db;

            let crew = store::select_crew(db, crew_id)
                .await?
                .ok_or(AppError::NotFound("crew"))?;
            let members = store::member_count(db, crew_id).await?;
            let polls = store::polls_for_crew(db, crew_id).await?;

            let data = json!({
                "crew": crew,
                "members": members,
                "polls": polls,
            });
            render(req.state(), "crew", &data)
        }

        /**
         * GET /crew/:id/packing
         */
        pub async fn packing(req: Request<AppState>) -> Result<Response, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let db = &req.state().db;

            let crew = store::select_crew(db, crew_id)
                .await?
                .ok_or(AppError::NotFound("crew"))?;
            let items = store::packing_items(db, crew_id).await?;

            let data = json!({
                "crew": crew,
                "items": items,
                "signed_in": current_user(&req).is_some(),
            });
            render(req.state(), "packing", &data)
        }

        /**
         * POST /crew/:id/packing
         */
        pub async fn add_packing_item(
            mut req: Request<AppState>,
        ) -> Result<Response, tide::Error> {
            let form: PackingItemRequest = req.body_form().await?;
            let crew_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            ensure_member(&req.state().db, crew_id, user).await?;

            let label = form.label.trim().to_string();
            if label.is_empty() {
                return Err(AppError::Invalid("label is required".to_string()).into());
            }

            store::add_packing_item(&req.state().db, crew_id, &label).await?;
            Ok(Redirect::new(format!("/crew/{}/packing", crew_id)).into())
        }

        /**
         * POST /crew/:id/packing/:item/toggle
         */
        pub async fn toggle_packing_item(
            req: Request<AppState>,
        ) -> Result<Response, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let item_id = param_uuid(&req, "item")?;
            let user = require_user(&req)?;
            ensure_member(&req.state().db, crew_id, user).await?;

            store::toggle_packing_item(&req.state().db, item_id).await?;
            Ok(Redirect::new(format!("/crew/{}/packing", crew_id)).into())
        }

        /**
         * GET /crew/:id/rideshare
         */
        pub async fn rideshare(req: Request<AppState>) -> Result<Response, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let viewer = current_user(&req);
            let db = &req.state().db;

            let crew = store::select_crew(db, crew_id)
                .await?
                .ok_or(AppError::NotFound("crew"))?;
            let entries: Vec<serde_json::Value> = store::rideshares(db, crew_id, None)
                .await?
                .into_iter()
                .map(|entry| {
                    json!({
                        "id": entry.id,
                        "is_driver": entry.is_driver,
                        "seats": entry.seats,
                        "note": entry.note,
                        "yours": Some(entry.user_id) == viewer,
                    })
                })
                .collect();

            let data = json!({
                "crew": crew,
                "entries": entries,
                "signed_in": viewer.is_some(),
            });
            render(req.state(), "rideshare", &data)
        }

        /**
         * POST /crew/:id/rideshare
         */
        pub async fn save_rideshare(mut req: Request<AppState>) -> Result<Response, tide::Error> {
            let form: RideshareForm = req.body_form().await?;
            let crew_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            ensure_member(&req.state().db, crew_id, user).await?;

            if form.seats < 1 {
                return Err(AppError::Invalid("seats must be at least 1".to_string()).into());
            }

            store::upsert_rideshare(
                &req.state().db,
                crew_id,
                user,
                form.role == RideshareRole::Driver,
                form.seats,
                form.note.trim(),
            )
            .await?;
            Ok(Redirect::new(format!("/crew/{}/rideshare", crew_id)).into())
        }

        /**
         * GET /crew/:id/polls/:poll
         */
        pub async fn poll(req: Request<AppState>) -> Result<Response, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let poll_id = param_uuid(&req, "poll")?;
            let viewer = current_user(&req);

            let session =
                VotingSession::open(PgVoteStore::new(req.state().db.clone()), poll_id, viewer)
                    .await?;
            let poll = session.poll();
            let own = session.own_choice().map(i32::from);
            let counts = session.tally();

            let data = json!({
                "crew_id": crew_id,
                "title": poll.title.as_deref().unwrap_or("Set Conflict Poll"),
                "poll": poll,
                "voted": own.is_some(),
                "signed_in": viewer.is_some(),
                "can_modify": session.can_modify(),
                "option_1": {
                    "name": &poll.artist_1_name,
                    "time": &poll.artist_1_time,
                    "stage": &poll.artist_1_stage,
                    "count": counts.option_1,
                    "chosen": own == Some(1),
                },
                "option_2": {
                    "name": &poll.artist_2_name,
                    "time": &poll.artist_2_time,
                    "stage": &poll.artist_2_stage,
                    "count": counts.option_2,
                    "chosen": own == Some(2),
                },
            });
            render(req.state(), "poll", &data)
        }

        /**
         * POST /crew/:id/polls/:poll/vote
         */
        pub async fn vote(mut req: Request<AppState>) -> Result<Response, tide::Error> {
            let ballot: BallotRequest = req.body_form().await?;
            let crew_id = param_uuid(&req, "id")?;
            let poll_id = param_uuid(&req, "poll")?;
            let choice = Choice::from_i32(ballot.choice)?;
            let viewer = current_user(&req);

            let mut session =
                VotingSession::open(PgVoteStore::new(req.state().db.clone()), poll_id, viewer)
                    .await?;
            let outcome = session.cast_or_change(choice).await?;
            if outcome == CastOutcome::Declined {
                return Err(AppError::Unauthenticated.into());
            }

            debug!("vote on {}: {:?}", poll_id, outcome);
            Ok(Redirect::new(format!("/crew/{}/polls/{}", crew_id, poll_id)).into())
        }
    }

    pub mod crews {
        use log::*;
        use tide::{Body, Request, Response, StatusCode};

        use crate::api_models::{CrewRequest, CrewResponse, JoinRequest};
        use crate::errors::AppError;
        use crate::store;
        use crate::{ensure_member, generate_join_code, param_uuid, require_user, AppState};

        /**
         * PUT /api/v1/crews
         */
        pub async fn create(mut req: Request<AppState>) -> Result<Response, tide::Error> {
            let body: CrewRequest = req.body_json().await?;
            let user = require_user(&req)?;

            if body.name.trim().is_empty() || body.festival.trim().is_empty() {
                return Err(
                    AppError::Invalid("name and festival are required".to_string()).into(),
                );
            }

            let crew = store::create_crew(
                &req.state().db,
                body.name.trim(),
                body.festival.trim(),
                &generate_join_code(),
                user,
            )
            .await?;

            info!("crew created: {} ({})", crew.name, crew.id);
            let response = Response::builder(StatusCode::Created)
                .body(Body::from_json(&crew)?)
                .build();
            Ok(response)
        }

        /**
         * GET /api/v1/crews
         */
        pub async fn list(req: Request<AppState>) -> Result<Body, tide::Error> {
            let user = require_user(&req)?;
            let crews = store::crews_for_user(&req.state().db, user).await?;
            Body::from_json(&crews)
        }

        /**
         * GET /api/v1/crews/:id
         */
        pub async fn get(req: Request<AppState>) -> Result<Body, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let db = &req.state().db;

            let crew = store::select_crew(db, crew_id)
                .await?
                .ok_or(AppError::NotFound("crew"))?;
            let members = store::member_count(db, crew_id).await?;

            Body::from_json(&CrewResponse { crew, members })
        }

        /**
         * POST /api/v1/crews/:id
         */
        pub async fn update(mut req: Request<AppState>) -> Result<Body, tide::Error> {
            let body: CrewRequest = req.body_json().await?;
            let crew_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            ensure_member(&req.state().db, crew_id, user).await?;

            if body.name.trim().is_empty() || body.festival.trim().is_empty() {
                return Err(
                    AppError::Invalid("name and festival are required".to_string()).into(),
                );
            }

            let crew = store::update_crew(
                &req.state().db,
                crew_id,
                body.name.trim(),
                body.festival.trim(),
            )
            .await?;
            Body::from_json(&crew)
        }

        /**
         * POST /api/v1/crews/join
         */
        pub async fn join(mut req: Request<AppState>) -> Result<Response, tide::Error> {
            let body: JoinRequest = req.body_json().await?;
            let user = require_user(&req)?;
            let db = &req.state().db;

            let code = body.code.trim().to_uppercase();
            let crew = store::select_crew_by_join_code(db, &code)
                .await?
                .ok_or(AppError::NotFound("crew"))?;

            if store::is_member(db, crew.id, user).await? {
                return Err(AppError::Conflict("already in this crew").into());
            }

            store::join_crew(db, crew.id, user).await?;
            info!("{} joined crew {}", user, crew.id);

            let response = Response::builder(StatusCode::Created)
                .body(Body::from_json(&crew)?)
                .build();
            Ok(response)
        }
    }

    pub mod packing {
        use tide::{Body, Request, Response, StatusCode};

        use crate::api_models::PackingItemRequest;
        use crate::errors::AppError;
        use crate::store;
        use crate::{ensure_member, param_uuid, require_user, AppState};

        /**
         * GET /api/v1/crews/:id/packing
         */
        pub async fn list(req: Request<AppState>) -> Result<Body, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let items = store::packing_items(&req.state().db, crew_id).await?;
            Body::from_json(&items)
        }

        /**
         * PUT /api/v1/crews/:id/packing
         */
        pub async fn add(mut req: Request<AppState>) -> Result<Response, tide::Error> {
            let body: PackingItemRequest = req.body_json().await?;
            let crew_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            ensure_member(&req.state().db, crew_id, user).await?;

            let label = body.label.trim().to_string();
            if label.is_empty() {
                return Err(AppError::Invalid("label is required".to_string()).into());
            }

            let item = store::add_packing_item(&req.state().db, crew_id, &label).await?;
            let response = Response::builder(StatusCode::Created)
                .body(Body::from_json(&item)?)
                .build();
            Ok(response)
        }

        /**
         * POST /api/v1/packing/:id/toggle
         */
        pub async fn toggle(req: Request<AppState>) -> Result<Body, tide::Error> {
            let item_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            let db = &req.state().db;

            let item = store::select_packing_item(db, item_id)
                .await?
                .ok_or(AppError::NotFound("packing item"))?;
            ensure_member(db, item.crew_id, user).await?;

            let item = store::toggle_packing_item(db, item_id).await?;
            Body::from_json(&item)
        }
    }

    pub mod rideshare {
        use tide::{Body, Request, Response, StatusCode};

        use crate::api_models::{RideshareFilter, RideshareForm, RideshareRole};
        use crate::errors::AppError;
        use crate::store;
        use crate::{ensure_member, param_uuid, require_user, AppState};

        /**
         * GET /api/v1/crews/:id/rideshares
         */
        pub async fn list(req: Request<AppState>) -> Result<Body, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let filter: RideshareFilter = serde_qs::from_str(req.url().query().unwrap_or(""))
                .map_err(|err| {
                    tide::Error::from_str(StatusCode::BadRequest, err.to_string())
                })?;

            let is_driver = filter.role.map(|role| role == RideshareRole::Driver);
            let entries = store::rideshares(&req.state().db, crew_id, is_driver).await?;
            Body::from_json(&entries)
        }

        /**
         * PUT /api/v1/crews/:id/rideshares
         */
        pub async fn save(mut req: Request<AppState>) -> Result<Body, tide::Error> {
            let body: RideshareForm = req.body_json().await?;
            let crew_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            ensure_member(&req.state().db, crew_id, user).await?;

            if body.seats < 1 {
                return Err(AppError::Invalid("seats must be at least 1".to_string()).into());
            }

            let entry = store::upsert_rideshare(
                &req.state().db,
                crew_id,
                user,
                body.role == RideshareRole::Driver,
                body.seats,
                body.note.trim(),
            )
            .await?;
            Body::from_json(&entry)
        }

        /**
         * DELETE /api/v1/rideshares/:id
         */
        pub async fn delete(req: Request<AppState>) -> Result<Response, tide::Error> {
            let entry_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;

            store::delete_rideshare(&req.state().db, entry_id, user).await?;
            Ok(Response::new(StatusCode::NoContent))
        }
    }

    pub mod polls {
        use log::*;
        use tide::{Body, Request, Response, StatusCode};

        use crate::api_models::{BallotRequest, PollRequest, PollResponse, VoteResponse};
        use crate::errors::AppError;
        use crate::store::{self, PgVoteStore};
        use crate::voting::{self, CastOutcome, Choice, VotingSession};
        use crate::{current_user, ensure_member, param_uuid, require_user, AppState};

        fn validated_title(body: &PollRequest) -> Result<Option<&str>, AppError> {
            for slot in [&body.artist_1, &body.artist_2].iter() {
                if slot.name.trim().is_empty() {
                    return Err(AppError::Invalid("both artists need a name".to_string()));
                }
            }
            Ok(body
                .title
                .as_deref()
                .map(str::trim)
                .filter(|title| !title.is_empty()))
        }

        /**
         * PUT /api/v1/crews/:id/polls
         */
        pub async fn create(mut req: Request<AppState>) -> Result<Response, tide::Error> {
            let body: PollRequest = req.body_json().await?;
            let crew_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            ensure_member(&req.state().db, crew_id, user).await?;

            let title = validated_title(&body)?;
            let poll = store::create_poll(
                &req.state().db,
                crew_id,
                user,
                title,
                &body.artist_1,
                &body.artist_2,
            )
            .await?;

            info!("poll created in crew {}: {}", crew_id, poll.id);
            let response = Response::builder(StatusCode::Created)
                .body(Body::from_json(&poll)?)
                .build();
            Ok(response)
        }

        /**
         * GET /api/v1/crews/:id/polls
         */
        pub async fn list(req: Request<AppState>) -> Result<Body, tide::Error> {
            let crew_id = param_uuid(&req, "id")?;
            let polls = store::polls_for_crew(&req.state().db, crew_id).await?;
            Body::from_json(&polls)
        }

        /**
         * GET /api/v1/polls/:id
         */
        pub async fn get(req: Request<AppState>) -> Result<Body, tide::Error> {
            let poll_id = param_uuid(&req, "id")?;
            let viewer = current_user(&req);

            let session =
                VotingSession::open(PgVoteStore::new(req.state().db.clone()), poll_id, viewer)
                    .await?;

            Body::from_json(&PollResponse {
                poll: session.poll().clone(),
                own_vote: session.own_choice().map(i32::from),
                tally: session.tally(),
                can_modify: session.can_modify(),
            })
        }

        /**
         * POST /api/v1/polls/:id
         */
        pub async fn update(mut req: Request<AppState>) -> Result<Body, tide::Error> {
            let body: PollRequest = req.body_json().await?;
            let poll_id = param_uuid(&req, "id")?;
            let user = require_user(&req)?;
            let db = &req.state().db;

            let poll = store::select_poll(db, poll_id)
                .await?
                .ok_or(AppError::NotFound("poll"))?;
            if !voting::can_modify(&poll, Some(user)) {
                return Err(
                    AppError::Forbidden("only the poll's creator can edit it").into()
                );
            }

            let title = validated_title(&body)?;
            let poll =
                store::update_poll(db, poll_id, title, &body.artist_1, &body.artist_2).await?;
            Body::from_json(&poll)
        }

        /**
         * DELETE /api/v1/polls/:id
         */
        pub async fn delete(req: Request<AppState>) -> Result<Response, tide::Error> {
            let poll_id = param_uuid(&req, "id")?;
            let viewer = current_user(&req);

            let session =
                VotingSession::open(PgVoteStore::new(req.state().db.clone()), poll_id, viewer)
                    .await?;
            session.delete_poll().await?;

            info!("poll deleted: {}", poll_id);
            Ok(Response::new(StatusCode::NoContent))
        }

        /**
         * POST /api/v1/polls/:id/vote
         */
        pub async fn vote(mut req: Request<AppState>) -> Result<Body, tide::Error> {
            let ballot: BallotRequest = req.body_json().await?;
            let poll_id = param_uuid(&req, "id")?;
            let choice = Choice::from_i32(ballot.choice)?;
            let viewer = current_user(&req);

            let mut session =
                VotingSession::open(PgVoteStore::new(req.state().db.clone()), poll_id, viewer)
                    .await?;
            let outcome = session.cast_or_change(choice).await?;
            if outcome == CastOutcome::Declined {
                return Err(AppError::Unauthenticated.into());
            }

            debug!("vote on {}: {:?}", poll_id, outcome);
            Body::from_json(&VoteResponse {
                outcome,
                own_vote: session.own_choice().map(i32::from),
                tally: session.tally(),
            })
        }

        /**
         * GET /api/v1/polls/:id/results
         */
        pub async fn results(req: Request<AppState>) -> Result<Body, tide::Error> {
            let poll_id = param_uuid(&req, "id")?;
            let db = &req.state().db;

            store::select_poll(db, poll_id)
                .await?
                .ok_or(AppError::NotFound("poll"))?;
            let votes = store::select_votes(db, poll_id).await?;

            let counts = voting::tally(&votes);
            debug!("{} ballots counted for {}", counts.total(), poll_id);
            Body::from_json(&counts)
        }
    }
}

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv().ok();
    pretty_env_logger::init();

    match create_pool().await {
        Ok(db) => {
            if let Err(err) = sqlx::migrate!("./migrations").run(&db).await {
                error!("Could not run migrations! {:?}", err);
                return Err(std::io::Error::new(std::io::ErrorKind::Other, err));
            }

            let templates = load_templates()
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?;
            let state = AppState {
                db,
                templates: Arc::new(templates),
            };

            let mut app = tide::with_state(state);
            app.with(driftwood::ApacheCombinedLogger);

            app.at("/").get(routes::pages::index);
            app.at("/crew/:id").get(routes::pages::crew);
            app.at("/crew/:id/packing")
                .get(routes::pages::packing)
                .post(routes::pages::add_packing_item);
            app.at("/crew/:id/packing/:item/toggle")
                .post(routes::pages::toggle_packing_item);
            app.at("/crew/:id/rideshare")
                .get(routes::pages::rideshare)
                .post(routes::pages::save_rideshare);
            app.at("/crew/:id/polls/:poll").get(routes::pages::poll);
            app.at("/crew/:id/polls/:poll/vote")
                .post(routes::pages::vote);

            app.at("/api/v1/crews")
                .put(routes::crews::create)
                .get(routes::crews::list);
            app.at("/api/v1/crews/join").post(routes::crews::join);
            app.at("/api/v1/crews/:id")
                .get(routes::crews::get)
                .post(routes::crews::update);
            app.at("/api/v1/crews/:id/packing")
                .get(routes::packing::list)
                .put(routes::packing::add);
            app.at("/api/v1/packing/:id/toggle")
                .post(routes::packing::toggle);
            app.at("/api/v1/crews/:id/rideshares")
                .get(routes::rideshare::list)
                .put(routes::rideshare::save);
            app.at("/api/v1/rideshares/:id")
                .delete(routes::rideshare::delete);
            app.at("/api/v1/crews/:id/polls")
                .put(routes::polls::create)
                .get(routes::polls::list);
            app.at("/api/v1/polls/:id")
                .get(routes::polls::get)
                .post(routes::polls::update)
                .delete(routes::polls::delete);
            app.at("/api/v1/polls/:id/vote").post(routes::polls::vote);
            app.at("/api/v1/polls/:id/results")
                .get(routes::polls::results);

            let addr =
                env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
            info!("Listening on {}", addr);
            app.listen(addr).await?;
            Ok(())
        }
        Err(err) => {
            error!("Could not initialize pool! {:?}", err);
            Err(std::io::Error::new(std::io::ErrorKind::Other, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_codes_are_six_characters_and_shoutable() {
        let code = generate_join_code();
        assert_eq!(code.len(), 6);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
