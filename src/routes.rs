//! Client-side route table.

/// A resolved route. Parsing never fails; unmatched paths land on
/// [`Route::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    Blog,
    Projects,
    Article { slug: String },
    Register,
    AdminLogin,
    Editor { id: Option<String> },
    Dashboard,
    NotFound,
}

impl Route {
    /// Map a location path (with optional query string) onto the route table.
    pub fn parse(path: &str) -> Route {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let path = path.trim_end_matches('/');
        match path {
            "" | "/" => Route::Home,
            "/about" => Route::About,
            "/blog" => Route::Blog,
            "/projects" => Route::Projects,
            "/register" => Route::Register,
            "/admin/login" => Route::AdminLogin,
            "/editor" => Route::Editor {
                id: query.and_then(query_id),
            },
            "/dashboard" => Route::Dashboard,
            _ => match path.strip_prefix("/articles/") {
                Some(slug) if !slug.is_empty() && !slug.contains('/') => Route::Article {
                    slug: slug.to_string(),
                },
                _ => Route::NotFound,
            },
        }
    }
}

/// Pull `id=<value>` out of a query string.
fn query_id(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "id" && !value.is_empty()).then(|| value.to_string())
    })
}
