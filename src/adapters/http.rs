use crate::domain::model::{
    Category, CategoryId, MoveSiteRequest, NewSite, OrderEntry, Site, SiteId,
};
use crate::domain::ports::{Catalog, ConfigProvider, OrderStore};
use crate::utils::error::{OrganizerError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use url::Url;

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

/// REST 後端的 reqwest 實作
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl RestBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("base_url", base_url)?;
        let mut base_url = Url::parse(base_url).map_err(|e| OrganizerError::InvalidConfigValueError {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        // 確保 join 時保留路徑前綴
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self::new(config.base_url())?.with_timeout(config.request_timeout()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| OrganizerError::ConfigError {
                message: format!("cannot build URL for '{}': {}", path, e),
            })?;

        let mut request = self.client.request(method, url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        Ok(request)
    }

    /// 送出請求；非 2xx 一律視為 PersistenceFailure
    async fn send(&self, call: &str, request: RequestBuilder) -> Result<Response> {
        tracing::debug!("📡 {}", call);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 {} -> {}", call, status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        } else {
            body
        };
        Err(OrganizerError::persistence(call, Some(status.as_u16()), message))
    }
}

#[async_trait]
impl OrderStore for RestBackend {
    async fn update_category_order(&self, entries: &[OrderEntry]) -> Result<()> {
        let request = self
            .request(Method::POST, "api/update-order/categories")?
            .json(entries);
        self.send("POST /api/update-order/categories", request).await?;
        Ok(())
    }

    async fn update_site_order(&self, entries: &[OrderEntry]) -> Result<()> {
        let request = self
            .request(Method::POST, "api/update-order/sites")?
            .json(entries);
        self.send("POST /api/update-order/sites", request).await?;
        Ok(())
    }

    async fn move_site(&self, site: SiteId, category: CategoryId) -> Result<()> {
        let body = MoveSiteRequest {
            site_id: site,
            new_category_id: category,
        };
        let request = self.request(Method::POST, "api/move-site")?.json(&body);
        self.send("POST /api/move-site", request).await?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for RestBackend {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let request = self.request(Method::GET, "api/categories")?;
        let response = self.send("GET /api/categories", request).await?;
        let categories = response.json::<Vec<Category>>().await?;
        Ok(categories)
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let request = self
            .request(Method::POST, "api/categories")?
            .json(&NameBody { name });
        let response = self.send("POST /api/categories", request).await?;
        Ok(response.json::<Category>().await?)
    }

    async fn rename_category(&self, id: CategoryId, name: &str) -> Result<()> {
        let call = format!("PUT /api/categories/{}", id);
        let request = self
            .request(Method::PUT, &format!("api/categories/{}", id))?
            .json(&NameBody { name });
        self.send(&call, request).await?;
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let call = format!("DELETE /api/categories/{}", id);
        let request = self.request(Method::DELETE, &format!("api/categories/{}", id))?;
        self.send(&call, request).await?;
        Ok(())
    }

    async fn create_site(&self, site: &NewSite) -> Result<Site> {
        let request = self.request(Method::POST, "api/sites")?.json(site);
        let response = self.send("POST /api/sites", request).await?;
        let mut created = response.json::<Site>().await?;
        created.category_id = site.category_id;
        Ok(created)
    }

    async fn rename_site(&self, id: SiteId, title: &str) -> Result<()> {
        let call = format!("PUT /api/sites/{}", id);
        let request = self
            .request(Method::PUT, &format!("api/sites/{}", id))?
            .json(&TitleBody { title });
        self.send(&call, request).await?;
        Ok(())
    }

    async fn delete_site(&self, id: SiteId) -> Result<()> {
        let call = format!("DELETE /api/sites/{}", id);
        let request = self.request(Method::DELETE, &format!("api/sites/{}", id))?;
        self.send(&call, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let backend = RestBackend::new("http://localhost:8000/bookmarks").unwrap();
        assert_eq!(backend.base_url().as_str(), "http://localhost:8000/bookmarks/");
        assert_eq!(
            backend.base_url().join("api/categories").unwrap().as_str(),
            "http://localhost:8000/bookmarks/api/categories"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(RestBackend::new("not a url").is_err());
        assert!(RestBackend::new("ftp://localhost").is_err());
    }
}
