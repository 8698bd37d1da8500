use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::{Error, LibResult};

const DEDICATED_SERVER_MARKER: &str = "dedicated server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub app_id: u32,
}

/// Dedicated server names mapped to their Steam app ID, iterated alphabetically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<String, u32>,
}

impl Catalog {
    /// Build a catalog out of every entry naming a dedicated server, the last duplicate name wins
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|entry| entry.name.to_lowercase().contains(DEDICATED_SERVER_MARKER))
            .map(|entry| (entry.name, entry.app_id))
            .collect();

        Self { entries }
    }

    pub fn app_id(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
struct AppListResponse {
    applist: AppList,
}

#[derive(Deserialize)]
struct AppList {
    apps: Vec<App>,
}

#[derive(Deserialize)]
struct App {
    appid: u32,
    name: String,
}

#[instrument(skip(client))]
pub async fn fetch_dedicated_servers(client: &reqwest::Client, url: &str) -> LibResult<Catalog> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::CatalogStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    debug!(bytes = body.len(), "Catalog downloaded");

    let parsed: AppListResponse = serde_json::from_str(&body).map_err(Error::CatalogParse)?;
    let total = parsed.applist.apps.len();

    let catalog = Catalog::from_entries(parsed.applist.apps.into_iter().map(|app| CatalogEntry {
        name: app.name,
        app_id: app.appid,
    }));

    info!(total, dedicated_servers = catalog.len(), "Catalog parsed");

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_list(apps: &[(u32, &str)]) -> serde_json::Value {
        let apps: Vec<serde_json::Value> = apps
            .iter()
            .map(|(appid, name)| serde_json::json!({ "appid": appid, "name": name }))
            .collect();

        serde_json::json!({ "applist": { "apps": apps } })
    }

    #[tokio::test]
    async fn keeps_only_dedicated_servers_sorted() {
        let mock_server = MockServer::start().await;

        let body = app_list(&[
            (10, "Counter-Strike"),
            (90, "Half-Life Dedicated Server"),
            (222860, "Left 4 Dead 2 Dedicated Server"),
            (376030, "ARK: Survival Evolved Dedicated Server"),
            (570, "Dota 2"),
            (294420, "7 Days to Die DEDICATED SERVER"),
            (380870, "Project Zomboid Dedicated Server"),
        ]);

        Mock::given(method("GET"))
            .and(path("/ISteamApps/GetAppList/v2/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let url = format!("{}/ISteamApps/GetAppList/v2/", mock_server.uri());
        let catalog = fetch_dedicated_servers(&reqwest::Client::new(), &url).await.unwrap();

        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(
            names,
            vec![
                "7 Days to Die DEDICATED SERVER",
                "ARK: Survival Evolved Dedicated Server",
                "Half-Life Dedicated Server",
                "Left 4 Dead 2 Dedicated Server",
                "Project Zomboid Dedicated Server",
            ]
        );
        assert_eq!(catalog.app_id("Half-Life Dedicated Server"), Some(90));
        assert_eq!(catalog.app_id("Dota 2"), None);
    }

    #[test]
    fn duplicate_names_keep_the_last_id() {
        let catalog = Catalog::from_entries([
            CatalogEntry {
                name: "Rust Dedicated Server".to_string(),
                app_id: 1,
            },
            CatalogEntry {
                name: "Rust Dedicated Server".to_string(),
                app_id: 258550,
            },
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.app_id("Rust Dedicated Server"), Some(258550));
    }

    #[tokio::test]
    async fn non_success_status_is_a_network_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let error = fetch_dedicated_servers(&reqwest::Client::new(), &mock_server.uri())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Network);
        assert!(matches!(error, Error::CatalogStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn unexpected_body_is_a_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"applist": {"games": []}}"#))
            .mount(&mock_server)
            .await;

        let error = fetch_dedicated_servers(&reqwest::Client::new(), &mock_server.uri())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Parse);
    }
}
