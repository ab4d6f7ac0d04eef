#[derive(Clone, Copy, Debug, PartialEq, Eq, tsify::Tsify, serde::Serialize, serde::Deserialize)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    BookList,
    Logs,
}

impl Route {
    pub const ALL: [Route; 2] = [Route::BookList, Route::Logs];

    /// Unknown paths have no page.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL.into_iter().find(|route| route.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::BookList => "/",
            Route::Logs => "/pages/logs",
        }
    }
}
