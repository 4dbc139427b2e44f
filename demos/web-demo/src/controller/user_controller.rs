use maya_web::prelude::*;
use std::sync::Arc;

use crate::models::{CreateUserRequest, UpdateUserRequest};
use crate::service::UserService;

pub struct UserController {
    user_service: Arc<UserService>,
}

impl Injectable for UserController {
    fn inject(injector: &Injector) -> ContainerResult<Self> {
        Ok(UserController {
            user_service: injector.resolve()?,
        })
    }
}

fn user_id(req: &MayaRequest) -> Option<u32> {
    req.param("id").and_then(|id| id.parse().ok())
}

fn numeric_id() -> Check {
    Check::field("id")
        .params()
        .rule("must be a number", |value| {
            value
                .and_then(Value::as_str)
                .is_some_and(|id| id.parse::<u32>().is_ok())
        })
}

fn user_not_found(id: Option<u32>) -> ResponseEntity<Value> {
    ResponseEntity::not_found(json!({ "message": format!("User {:?} not found", id) }))
}

impl UserController {
    async fn list(self: Arc<Self>, _req: MayaRequest) -> Json<Value> {
        Json(json!(self.user_service.list_users()))
    }

    async fn find(self: Arc<Self>, req: MayaRequest) -> ResponseEntity<Value> {
        let id = user_id(&req);
        match id.and_then(|id| self.user_service.get_user(id)) {
            Some(user) => ResponseEntity::ok(json!(user)),
            None => user_not_found(id),
        }
    }

    async fn create(self: Arc<Self>, req: MayaRequest) -> anyhow::Result<ResponseEntity<Value>> {
        let request: CreateUserRequest = req.json().context("Invalid user payload")?;
        let user = self.user_service.create_user(request);
        tracing::info!(id = user.id, "User created");
        Ok(ResponseEntity::created(json!(user)))
    }

    async fn update(self: Arc<Self>, req: MayaRequest) -> anyhow::Result<ResponseEntity<Value>> {
        let id = user_id(&req);
        let request: UpdateUserRequest = req.json().context("Invalid update payload")?;
        Ok(match id.and_then(|id| self.user_service.update_user(id, request)) {
            Some(user) => ResponseEntity::ok(json!(user)),
            None => user_not_found(id),
        })
    }

    async fn remove(self: Arc<Self>, req: MayaRequest) -> StatusCode {
        match user_id(&req) {
            Some(id) if self.user_service.delete_user(id) => StatusCode::NO_CONTENT,
            _ => StatusCode::NOT_FOUND,
        }
    }
}

impl Controller for UserController {
    fn configure(routes: &mut Routes<Self>) {
        routes.get("/", Self::list);

        routes.get("/:id", Self::find).middleware(numeric_id());

        routes.post("/", Self::create).middlewares([
            Check::field("name").is_string().min_length(2).max_length(50),
            Check::field("email").is_email(),
            Check::field("password").is_password(),
        ]);

        routes.patch("/:id", Self::update).middlewares([
            numeric_id(),
            Check::field("active").is_boolean(),
        ]);

        routes.delete("/:id", Self::remove).middleware(numeric_id());
    }
}
