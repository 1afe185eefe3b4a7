use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path/query parameters before heap allocation.
/// Every route in this service has at most one templated segment.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Parameter names come from the static route table and are shared as
/// `Arc<str>`; values are per-request data extracted from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// How a registered path is matched against an incoming request path.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Exact string comparison (e.g. `/errortest`).
    Literal(String),
    /// A path with `{name}` segments compiled to a regex with one capture
    /// group per parameter.
    Template {
        pattern: String,
        regex: Regex,
        param_names: Vec<Arc<str>>,
    },
    /// A raw regex over the full request path, for matchers a template
    /// cannot express (e.g. "path is all digits").
    Regex(Regex),
    /// Matches any path and any method. Only useful as the last entry.
    CatchAll,
}

impl PathPattern {
    /// Human-readable form of the pattern for logs and `dump_routes`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            PathPattern::Literal(p) => p,
            PathPattern::Template { pattern, .. } => pattern,
            PathPattern::Regex(re) => re.as_str(),
            PathPattern::CatchAll => "*",
        }
    }
}

/// One entry of the route table.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    /// Method constraint; `None` matches every method (catch-all routes).
    pub method: Option<Method>,
    pub pattern: PathPattern,
    /// Name the dispatcher resolves to a handler channel.
    pub handler_name: String,
}

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteMeta>,
    /// Name of the handler that should process this request.
    pub handler_name: String,
    /// Path parameters extracted from templated segments.
    pub path_params: ParamVec,
    /// Query string parameters (populated by the server).
    pub query_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name. Last write wins when a name repeats
    /// at different path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Router that matches HTTP requests against an ordered route table.
///
/// The table is scanned in registration order and the first matching
/// entry wins, so more specific patterns must be registered before any
/// overlapping catch-all. The table is built once at startup via
/// [`Router::builder`] and is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Arc<RouteMeta>>,
}

impl Router {
    /// Start building a route table.
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder { routes: Vec::new() }
    }

    /// Match an HTTP request to a route.
    ///
    /// Routes with a method constraint only match that method; the scan
    /// continues past them otherwise. Returns `None` when nothing
    /// matched and no catch-all is registered.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "route match attempt");

        for route in &self.routes {
            if let Some(m) = &route.method {
                if m != method {
                    continue;
                }
            }
            let path_params = match &route.pattern {
                PathPattern::Literal(p) => {
                    if p != path {
                        continue;
                    }
                    ParamVec::new()
                }
                PathPattern::Template {
                    regex, param_names, ..
                } => match regex.captures(path) {
                    Some(caps) => param_names
                        .iter()
                        .enumerate()
                        .filter_map(|(i, name)| {
                            caps.get(i + 1)
                                .map(|m| (name.clone(), m.as_str().to_string()))
                        })
                        .collect(),
                    None => continue,
                },
                PathPattern::Regex(re) => {
                    if !re.is_match(path) {
                        continue;
                    }
                    ParamVec::new()
                }
                PathPattern::CatchAll => ParamVec::new(),
            };

            info!(
                method = %method,
                path = %path,
                handler_name = %route.handler_name,
                route_pattern = %route.pattern.as_str(),
                path_params = ?path_params,
                "route matched"
            );
            return Some(RouteMatch {
                route: route.clone(),
                handler_name: route.handler_name.clone(),
                path_params,
                query_params: ParamVec::new(),
            });
        }

        warn!(method = %method, path = %path, "no route matched");
        None
    }

    /// Print all registered routes to stdout, in match-priority order.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            let method = route
                .method
                .as_ref()
                .map_or_else(|| "*".to_string(), Method::to_string);
            println!(
                "[route] {method} {} -> {}",
                route.pattern.as_str(),
                route.handler_name
            );
        }
    }

    /// Convert a templated path to a regex and its ordered parameter names.
    ///
    /// `/books/{id}` becomes `^/books/([^/]+)$` with parameter names
    /// `["id"]`.
    pub(crate) fn template_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let name = segment.trim_start_matches('{').trim_end_matches('}');
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }
        if pattern == "^" {
            pattern.push('/');
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).expect("failed to compile path regex");
        (regex, param_names)
    }
}

/// Declarative route-registration API.
///
/// Registration order is match-priority order; the builder performs no
/// reordering or specificity ranking.
pub struct RouterBuilder {
    routes: Vec<RouteMeta>,
}

impl RouterBuilder {
    /// Register a literal or templated path for one method. Paths
    /// containing `{name}` segments are compiled to templates.
    #[must_use]
    pub fn route(mut self, method: Method, path: &str, handler_name: &str) -> Self {
        let pattern = if path.contains('{') {
            let (regex, param_names) = Router::template_to_regex(path);
            PathPattern::Template {
                pattern: path.to_string(),
                regex,
                param_names,
            }
        } else {
            PathPattern::Literal(path.to_string())
        };
        self.routes.push(RouteMeta {
            method: Some(method),
            pattern,
            handler_name: handler_name.to_string(),
        });
        self
    }

    /// Register a raw regex matcher over the full request path,
    /// including the leading slash.
    #[must_use]
    pub fn regex(mut self, method: Method, pattern: &str, handler_name: &str) -> Self {
        let regex = Regex::new(pattern).expect("failed to compile route regex");
        self.routes.push(RouteMeta {
            method: Some(method),
            pattern: PathPattern::Regex(regex),
            handler_name: handler_name.to_string(),
        });
        self
    }

    /// Register the five conventional routes of a collection resource.
    ///
    /// For `resource("/books", "books")`:
    ///
    /// | Method | Path | Handler |
    /// |---|---|---|
    /// | GET | `/books` | `books.read_many` |
    /// | POST | `/books` | `books.create` |
    /// | DELETE | `/books` | `books.delete_many` |
    /// | GET | `/books/{id}` | `books.read` |
    /// | DELETE | `/books/{id}` | `books.delete` |
    #[must_use]
    pub fn resource(self, path: &str, name: &str) -> Self {
        let item = format!("{path}/{{id}}");
        self.route(Method::GET, path, &format!("{name}.read_many"))
            .route(Method::POST, path, &format!("{name}.create"))
            .route(Method::DELETE, path, &format!("{name}.delete_many"))
            .route(Method::GET, &item, &format!("{name}.read"))
            .route(Method::DELETE, &item, &format!("{name}.delete"))
    }

    /// Register a fallback matched for any method and path. Register it
    /// last; anything after it is unreachable.
    #[must_use]
    pub fn catch_all(mut self, handler_name: &str) -> Self {
        self.routes.push(RouteMeta {
            method: None,
            pattern: PathPattern::CatchAll,
            handler_name: handler_name.to_string(),
        });
        self
    }

    /// Finalize the table.
    #[must_use]
    pub fn build(self) -> Router {
        info!(routes_count = self.routes.len(), "routing table loaded");
        Router {
            routes: self.routes.into_iter().map(Arc::new).collect(),
        }
    }
}
