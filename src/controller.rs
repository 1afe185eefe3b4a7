//! Resource controllers: a grouping of handler methods operating on one
//! collection, plus a pre-dispatch hook.
//!
//! A registered controller runs on a single dedicated coroutine that
//! owns it outright, so all access to its store is serialized through
//! that coroutine's channel. Concurrent requests against the same
//! resource are therefore handled one at a time, in arrival order.

use anyhow::anyhow;
use may::coroutine;
use may::sync::mpsc;
use tracing::{debug, error, info};

use crate::dispatcher::{
    into_response, Dispatcher, HandlerRequest, HandlerResponse, HandlerResult, HandlerSender,
    HeaderVec,
};
use crate::runtime_config::RuntimeConfig;

/// The conventional operation names a controller serves. Route
/// registration via `RouterBuilder::resource` produces handler names of
/// the form `{resource}.{operation}` matching these.
pub const RESOURCE_OPS: [&str; 5] = ["create", "read_many", "read", "delete_many", "delete"];

/// Collection- and item-level operations over one resource.
///
/// All methods take `&mut self`: the owning coroutine is the only place
/// they ever run, so no further synchronization is needed.
pub trait ResourceController: Send + 'static {
    /// Runs before every operation. Headers pushed here are merged into
    /// whatever response the operation produces; an `Err` surfaces to
    /// the central error handler and the operation never runs.
    fn before(&mut self, _req: &HandlerRequest, _headers: &mut HeaderVec) -> anyhow::Result<()> {
        Ok(())
    }

    /// Create one entity from the request body.
    fn create(&mut self, req: &HandlerRequest) -> HandlerResult;

    /// Return the full ordered entity sequence.
    fn read_many(&mut self, req: &HandlerRequest) -> HandlerResult;

    /// Fetch one entity by identifier.
    fn read(&mut self, id: &str, req: &HandlerRequest) -> HandlerResult;

    /// Remove every entity.
    fn delete_many(&mut self, req: &HandlerRequest) -> HandlerResult;

    /// Remove every entity with the given identifier.
    fn delete(&mut self, id: &str, req: &HandlerRequest) -> HandlerResult;
}

fn run_operation<C: ResourceController>(
    controller: &mut C,
    req: &HandlerRequest,
) -> HandlerResult {
    let op = req.handler_name.rsplit('.').next().unwrap_or_default();
    match op {
        "create" => controller.create(req),
        "read_many" => controller.read_many(req),
        "delete_many" => controller.delete_many(req),
        "read" | "delete" => {
            let id = req
                .get_path_param("id")
                .ok_or_else(|| anyhow!("missing path value 'id'"))?
                .to_string();
            if op == "read" {
                controller.read(&id, req)
            } else {
                controller.delete(&id, req)
            }
        }
        other => Err(anyhow!("unknown resource operation '{other}'")),
    }
}

/// Spawn a coroutine owning the controller and return the sender that
/// feeds it requests.
///
/// # Safety
///
/// `may::coroutine::Builder::spawn` is unsafe in the `may` runtime; call
/// during startup once the runtime is configured.
pub unsafe fn spawn_controller<C: ResourceController>(mut controller: C) -> HandlerSender {
    let (tx, rx) = mpsc::channel::<HandlerRequest>();
    let stack_size = RuntimeConfig::from_env().stack_size;

    let spawn_result = coroutine::Builder::new()
        .stack_size(stack_size)
        .spawn(move || {
            debug!(stack_size, "controller coroutine start");
            for req in rx.iter() {
                let reply_tx = req.reply_tx.clone();
                let request_id = req.request_id;
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    let mut extra_headers = HeaderVec::new();
                    let result = controller
                        .before(&req, &mut extra_headers)
                        .and_then(|()| run_operation(&mut controller, &req));
                    let mut response = into_response(result);
                    for (name, value) in extra_headers {
                        response.set_header(&name, value);
                    }
                    response
                }));
                let response = match outcome {
                    Ok(resp) => resp,
                    Err(panic) => {
                        error!(
                            request_id = %request_id,
                            handler_name = %req.handler_name,
                            panic_message = ?panic,
                            "controller operation panicked"
                        );
                        HandlerResponse::text(500, format!("handler panicked: {panic:?}"))
                    }
                };
                let _ = reply_tx.send(response);
            }
        });

    if let Err(e) = spawn_result {
        error!(error = %e, "failed to spawn controller coroutine");
    }
    tx
}

impl Dispatcher {
    /// Register a resource controller under the given resource name.
    ///
    /// One coroutine is spawned for the controller; one sender clone is
    /// inserted per conventional operation (`{name}.create`,
    /// `{name}.read_many`, ...), matching the handler names produced by
    /// `RouterBuilder::resource`.
    ///
    /// # Safety
    ///
    /// See [`spawn_controller`].
    pub unsafe fn register_controller<C: ResourceController>(&mut self, name: &str, controller: C) {
        let tx = spawn_controller(controller);
        for op in RESOURCE_OPS {
            self.handlers.insert(format!("{name}.{op}"), tx.clone());
        }
        info!(resource = %name, operations = RESOURCE_OPS.len(), "controller registered");
    }
}
