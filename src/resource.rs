//! Method-keyed resources.
//!
//! A resource groups the handlers for one URL under a name, the way a class
//! with `get` / `post` methods would in other frameworks. Shared state is
//! captured by the handlers:
//!
//! ```rust
//! use std::sync::Arc;
//! use tsu_utils::{Negotiable, Request, Resource, Router};
//!
//! struct Db;
//!
//! let db = Arc::new(Db);
//! let authors = Resource::new("AuthorList").get(move |_req: Request| {
//!     let _db = Arc::clone(&db);
//!     async move { Negotiable::new(serde_json::json!(["ursula", "iain"])) }
//! });
//!
//! let router = Router::new().resource("/authors/", authors);
//! assert_eq!(router.url_for("AuthorList:get", &[]).as_deref(), Some("/authors/"));
//! ```

use std::collections::HashMap;

use http::Method;

use crate::handler::{BoxedHandler, Handler};

/// A named set of per-method handlers registered together at one path.
pub struct Resource {
    name: String,
    handlers: Vec<(Method, BoxedHandler)>,
    names: HashMap<Method, String>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), handlers: Vec::new(), names: HashMap::new() }
    }

    pub fn name(&self) -> &str { &self.name }

    /// Registers `handler` for `method`, replacing any earlier one.
    pub fn method(mut self, method: Method, handler: impl Handler) -> Self {
        let handler = handler.into_boxed_handler();
        match self.handlers.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => entry.1 = handler,
            None => self.handlers.push((method, handler)),
        }
        self
    }

    pub fn get(self, handler: impl Handler) -> Self { self.method(Method::GET, handler) }
    pub fn post(self, handler: impl Handler) -> Self { self.method(Method::POST, handler) }
    pub fn put(self, handler: impl Handler) -> Self { self.method(Method::PUT, handler) }
    pub fn patch(self, handler: impl Handler) -> Self { self.method(Method::PATCH, handler) }
    pub fn delete(self, handler: impl Handler) -> Self { self.method(Method::DELETE, handler) }
    pub fn head(self, handler: impl Handler) -> Self { self.method(Method::HEAD, handler) }
    pub fn options(self, handler: impl Handler) -> Self { self.method(Method::OPTIONS, handler) }
    pub fn trace(self, handler: impl Handler) -> Self { self.method(Method::TRACE, handler) }

    /// Overrides the route name of one method.
    pub fn name_for(mut self, method: Method, name: impl Into<String>) -> Self {
        self.names.insert(method, name.into());
        self
    }

    /// Methods this resource handles, in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.handlers.iter().map(|(m, _)| m)
    }

    /// `"{Name}:{method}"` unless overridden.
    pub fn route_name(&self, method: &Method) -> String {
        self.names.get(method).cloned().unwrap_or_else(|| {
            format!("{}:{}", self.name, method.as_str().to_ascii_lowercase())
        })
    }

    pub(crate) fn into_handlers(self) -> Vec<(Method, BoxedHandler)> {
        self.handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    async fn noop(_req: Request) -> &'static str {
        ""
    }

    #[test]
    fn default_route_names() {
        let res = Resource::new("ArticleList").get(noop).delete(noop);
        assert_eq!(res.route_name(&Method::GET), "ArticleList:get");
        assert_eq!(res.route_name(&Method::DELETE), "ArticleList:delete");
    }

    #[test]
    fn overridden_route_names() {
        let res = Resource::new("Index").get(noop).name_for(Method::GET, "index_get");
        assert_eq!(res.route_name(&Method::GET), "index_get");
    }

    #[test]
    fn re_registering_a_method_replaces_it() {
        let res = Resource::new("R").get(noop).post(noop).get(noop);
        let methods: Vec<_> = res.methods().cloned().collect();
        assert_eq!(methods, vec![Method::GET, Method::POST]);
    }
}
