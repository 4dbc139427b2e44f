use maya_web::prelude::*;
use std::sync::Arc;

pub struct HomeController {
    databases: Arc<DatabaseRegistry>,
}

impl Injectable for HomeController {
    fn inject(injector: &Injector) -> ContainerResult<Self> {
        Ok(HomeController {
            databases: injector.resolve()?,
        })
    }
}

impl HomeController {
    async fn index(self: Arc<Self>, _req: MayaRequest) -> Value {
        json!({
            "name": "maya web demo",
            "databases": self.databases.names(),
        })
    }

    async fn echo(self: Arc<Self>, req: MayaRequest) -> Value {
        json!({
            "method": req.method.as_str(),
            "path": req.path(),
            "query": req.query,
            "body": req.body,
        })
    }
}

impl Controller for HomeController {
    fn configure(routes: &mut Routes<Self>) {
        routes.get("/", Self::index);
        routes.post("/echo", Self::echo);
    }
}
