//! Radix-tree request router with named routes.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. On top of
//! plain registration the router keeps a name → path table so handlers can
//! build URLs with [`Router::url_for`], registers method-keyed
//! [`Resource`]s in one call, and groups routes under shared URL and name
//! prefixes with [`Router::scope`].

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::error::{Error, Result};
use crate::handler::{BoxedHandler, Handler, ReplyFuture};
use crate::request::Request;
use crate::resource::Resource;

/// The application router.
///
/// Build it once at startup and hand it to an [`App`](crate::App). Each
/// registration returns `self`, so calls chain. The chaining methods panic on
/// an invalid pattern or duplicate name, since both are programming errors
/// caught at startup; the `try_*` variants return [`Error::InvalidRoute`].
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    names: HashMap<String, String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unnamed handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax (`{*name}` for catch-all) and are
    /// read with `req.param("name")`:
    ///
    /// ```rust
    /// # use http::Method;
    /// # use tsu_utils::{Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.try_route(method, path, handler, None)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Register a handler under a route name.
    pub fn named(self, method: Method, path: &str, handler: impl Handler, name: &str) -> Self {
        self.try_route(method, path, handler, Some(name))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_route(
        mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        name: Option<&str>,
    ) -> Result<Self> {
        self.insert(method, path, handler.into_boxed_handler(), name)?;
        Ok(self)
    }

    /// Register every method of a resource at `path`.
    ///
    /// Each method is named `"{Resource}:{method}"` (`"ArticleList:get"`)
    /// unless the resource overrides it with [`Resource::name_for`].
    pub fn resource(self, path: &str, resource: Resource) -> Self {
        self.try_resource(path, resource, None)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Like [`resource`](Self::resource), limited to `methods`.
    pub fn resource_methods(self, path: &str, resource: Resource, methods: &[Method]) -> Self {
        self.try_resource(path, resource, Some(methods))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_resource(
        self,
        path: &str,
        resource: Resource,
        methods: Option<&[Method]>,
    ) -> Result<Self> {
        self.add_resource(path, resource, methods, None)
    }

    fn add_resource(
        mut self,
        path: &str,
        resource: Resource,
        methods: Option<&[Method]>,
        name_prefix: Option<&str>,
    ) -> Result<Self> {
        let names: Vec<(Method, String)> = resource.methods()
            .map(|m| (m.clone(), resource.route_name(m)))
            .collect();
        for (method, handler) in resource.into_handlers() {
            if methods.is_some_and(|allowed| !allowed.contains(&method)) {
                continue;
            }
            let name = names.iter()
                .find(|(m, _)| *m == method)
                .map(|(_, name)| prefixed(name_prefix, name));
            self.insert(method, path, handler, name.as_deref())?;
        }
        Ok(self)
    }

    /// Group registrations under a URL prefix and an optional name prefix.
    ///
    /// ```rust
    /// # use http::Method;
    /// # use tsu_utils::{Request, Router};
    /// async fn list_articles(_: Request) -> &'static str { "…" }
    ///
    /// let router = Router::new().scope("/api/", Some("articles"), |s| {
    ///     s.route(Method::GET, "/articles/", list_articles)
    /// });
    /// assert_eq!(router.url_for("articles.list_articles", &[]).as_deref(), Some("/api/articles/"));
    /// ```
    pub fn scope(
        self,
        url_prefix: &str,
        name_prefix: Option<&str>,
        f: impl FnOnce(Scope) -> Scope,
    ) -> Self {
        let scope = Scope {
            router: self,
            url_prefix: url_prefix.to_owned(),
            name_prefix: name_prefix.map(str::to_owned),
        };
        f(scope).router
    }

    fn insert(
        &mut self,
        method: Method,
        path: &str,
        handler: BoxedHandler,
        name: Option<&str>,
    ) -> Result<()> {
        let invalid = |reason: String| Error::InvalidRoute { path: path.to_owned(), reason };

        if let Some(name) = name {
            if self.names.get(name).is_some_and(|existing| existing != path) {
                return Err(invalid(format!("duplicate route name `{name}`")));
            }
        }
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .map_err(|e| invalid(e.to_string()))?;
        if let Some(name) = name {
            self.names.insert(name.to_owned(), path.to_owned());
        }
        Ok(())
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    /// `true` when some handler is registered for `method` at `path`.
    pub fn resolves(&self, method: &Method, path: &str) -> bool {
        self.routes.get(method).is_some_and(|tree| tree.at(path).is_ok())
    }

    /// Methods with a handler at `path`, sorted by name.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.clone())
            .collect();
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allowed
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Result<(BoxedHandler, HashMap<String, String>)> {
        let matched = self.routes.get(method).and_then(|tree| tree.at(path).ok());
        let Some(matched) = matched else {
            let allowed = self.allowed_methods(path);
            return Err(if allowed.is_empty() {
                Error::NotFound
            } else {
                Error::MethodNotAllowed { allowed }
            });
        };
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Ok((handler, params))
    }

    /// Routes `req` to its handler. The returned future owns everything it
    /// needs, so it outlives the borrow of the router.
    pub(crate) fn dispatch(&self, mut req: Request) -> ReplyFuture<'static> {
        match self.lookup(&req.method, req.uri.path()) {
            Ok((handler, params)) => {
                req.params = params;
                handler.call(req)
            }
            Err(err) => Box::pin(std::future::ready(Err(err))),
        }
    }

    // ── Reverse routing ──────────────────────────────────────────────────────

    /// The path pattern registered under `name`.
    pub fn path_of(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Builds a URL for a named route, filling `{param}` segments.
    /// Returns `None` for an unknown name or a missing parameter.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        let pattern = self.path_of(name)?;
        let mut url = String::with_capacity(pattern.len());
        let mut rest = pattern;
        while let Some(start) = rest.find('{') {
            url.push_str(&rest[..start]);
            let end = rest[start..].find('}')? + start;
            let key = rest[start + 1..end].trim_start_matches('*');
            let (_, value) = params.iter().find(|(k, _)| *k == key)?;
            url.push_str(value);
            rest = &rest[end + 1..];
        }
        url.push_str(rest);
        Some(url)
    }
}

// ── Scope ─────────────────────────────────────────────────────────────────────

/// Registration helper returned by [`Router::scope`].
pub struct Scope {
    router: Router,
    url_prefix: String,
    name_prefix: Option<String>,
}

impl Scope {
    /// Registers a handler named after its function (`list_articles`), or
    /// unnamed for closures.
    pub fn route(self, method: Method, path: &str, handler: impl Handler) -> Self {
        let name = handler.default_name().map(str::to_owned);
        self.add(method, path, handler, name)
    }

    /// Registers a handler under an explicit name.
    pub fn named(self, method: Method, path: &str, handler: impl Handler, name: &str) -> Self {
        self.add(method, path, handler, Some(name.to_owned()))
    }

    pub fn resource(mut self, path: &str, resource: Resource) -> Self {
        let path = make_path(&self.url_prefix, path);
        self.router = self.router
            .add_resource(&path, resource, None, self.name_prefix.as_deref())
            .unwrap_or_else(|e| panic!("{e}"));
        self
    }

    fn add(mut self, method: Method, path: &str, handler: impl Handler, name: Option<String>) -> Self {
        let path = make_path(&self.url_prefix, path);
        let name = name.map(|n| prefixed(self.name_prefix.as_deref(), &n));
        self.router = self.router
            .try_route(method, &path, handler, name.as_deref())
            .unwrap_or_else(|e| panic!("{e}"));
        self
    }
}

/// `("/api/", "/articles/")` → `/api/articles/`.
fn make_path(url_prefix: &str, path: &str) -> String {
    if url_prefix.is_empty() {
        return path.to_owned();
    }
    format!("{}/{}", url_prefix.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn prefixed(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn index(_req: Request) -> &'static str {
        "index"
    }

    async fn show(_req: Request) -> &'static str {
        "show"
    }

    #[test]
    fn resolves_registered_routes() {
        let router = Router::new().on(Method::GET, "/articles/{id}", show);
        assert!(router.resolves(&Method::GET, "/articles/42"));
        assert!(!router.resolves(&Method::POST, "/articles/42"));
        assert!(!router.resolves(&Method::GET, "/articles"));
    }

    #[test]
    fn lookup_distinguishes_404_and_405() {
        let router = Router::new()
            .on(Method::GET, "/articles", index)
            .on(Method::POST, "/articles", index);

        assert!(matches!(router.lookup(&Method::GET, "/nope"), Err(Error::NotFound)));
        match router.lookup(&Method::DELETE, "/articles") {
            Err(Error::MethodNotAllowed { allowed }) => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("expected 405, got {:?}", other.err()),
        }
    }

    #[test]
    fn lookup_extracts_params() {
        let router = Router::new().on(Method::GET, "/users/{id}/posts/{post}", show);
        let (_, params) = router.lookup(&Method::GET, "/users/7/posts/9").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("7"));
        assert_eq!(params.get("post").map(String::as_str), Some("9"));
    }

    #[test]
    fn url_for_fills_params() {
        let router = Router::new()
            .named(Method::GET, "/articles/{pk}", show, "article")
            .named(Method::GET, "/files/{*rest}", show, "files");
        assert_eq!(router.url_for("article", &[("pk", "42")]).as_deref(), Some("/articles/42"));
        assert_eq!(router.url_for("files", &[("rest", "a/b.txt")]).as_deref(), Some("/files/a/b.txt"));
        assert_eq!(router.url_for("article", &[]), None);
        assert_eq!(router.url_for("missing", &[]), None);
    }

    #[test]
    fn invalid_patterns_are_reported() {
        let result = Router::new()
            .try_route(Method::GET, "/a", index, None)
            .and_then(|r| r.try_route(Method::GET, "/a", index, None));
        assert!(matches!(result, Err(Error::InvalidRoute { .. })));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = Router::new()
            .try_route(Method::GET, "/a", index, Some("dup"))
            .and_then(|r| r.try_route(Method::GET, "/b", index, Some("dup")));
        assert!(matches!(result, Err(Error::InvalidRoute { .. })));

        // Same name, same path, different method is fine.
        let result = Router::new()
            .try_route(Method::GET, "/a", index, Some("a"))
            .and_then(|r| r.try_route(Method::POST, "/a", index, Some("a")));
        assert!(result.is_ok());
    }

    #[test]
    fn resources_register_named_methods() {
        let router = Router::new()
            .resource("/my", Resource::new("MyResource").get(index).post(show))
            .resource(
                "/my2",
                Resource::new("MyResource2").get(index).post(index).name_for(Method::GET, "my_resource2_get"),
            );

        assert_eq!(router.url_for("MyResource:get", &[]).as_deref(), Some("/my"));
        assert_eq!(router.url_for("MyResource:post", &[]).as_deref(), Some("/my"));
        assert_eq!(router.url_for("my_resource2_get", &[]).as_deref(), Some("/my2"));
        assert_eq!(router.url_for("MyResource2:post", &[]).as_deref(), Some("/my2"));
        assert_eq!(router.url_for("MyResource2:get", &[]), None);
    }

    #[test]
    fn resource_methods_limits_registration() {
        let router = Router::new()
            .resource_methods("/child", Resource::new("Child").get(index).post(index), &[Method::GET]);
        assert!(router.resolves(&Method::GET, "/child"));
        assert!(!router.resolves(&Method::POST, "/child"));
        assert_eq!(router.path_of("Child:post"), None);
    }

    #[test]
    fn scopes_prefix_paths_and_names() {
        let router = Router::new()
            .scope("/api/", Some("articles"), |s| {
                s.route(Method::GET, "/articles/", index)
                    .named(Method::POST, "/articles/", index, "create")
                    .resource("/articles/{pk}", Resource::new("ArticleDetail").get(show))
            })
            .scope("", None, |s| s.route(Method::GET, "/", index));

        assert_eq!(router.url_for("articles.index", &[]).as_deref(), Some("/api/articles/"));
        assert_eq!(router.url_for("articles.create", &[]).as_deref(), Some("/api/articles/"));
        assert_eq!(
            router.url_for("articles.ArticleDetail:get", &[("pk", "42")]).as_deref(),
            Some("/api/articles/42"),
        );
        assert_eq!(router.url_for("index", &[]).as_deref(), Some("/"));
    }

    #[test]
    fn make_path_joins_with_one_slash() {
        assert_eq!(make_path("/api/", "/articles/"), "/api/articles/");
        assert_eq!(make_path("/api", "articles"), "/api/articles");
        assert_eq!(make_path("/api/", "/"), "/api/");
        assert_eq!(make_path("", "/x"), "/x");
    }
}
