//! HTTP item store.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list      | `GET /items?limit&offset&startDate&endDate` |
//! | create    | `POST /items` |
//! | update    | `PATCH /items/{id}` |
//! | delete    | `DELETE /items/{id}` |

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use wip_core::{
    CreateItemRequest, Error, Item, ItemStore, ListItemsQuery, ListItemsRequest,
    ListItemsResponse, Result, UpdateItemRequest,
};

use crate::client::ApiClient;
use crate::config::ClientConfig;

/// Item store backed by the wip HTTP API.
#[derive(Debug, Clone)]
pub struct HttpItemStore {
    api: ApiClient,
}

impl HttpItemStore {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(&config)?,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }
}

/// A 404 on an item route means the item is gone.
fn item_not_found(id: Uuid) -> impl FnOnce(Error) -> Error {
    move |e| match e {
        Error::NotFound(_) => Error::ItemNotFound(id),
        other => other,
    }
}

#[async_trait]
impl ItemStore for HttpItemStore {
    #[instrument(skip(self), fields(subsystem = "client"))]
    async fn list(&self, req: ListItemsRequest) -> Result<ListItemsResponse> {
        let query = ListItemsQuery::from(&req);
        let response = self
            .api
            .http()
            .get(self.api.url("items")?)
            .query(&query)
            .send()
            .await?;
        let page: ListItemsResponse = self.api.check("GET /items", response).await?.json().await?;
        debug!(
            offset = req.offset,
            returned = page.items.len(),
            has_more = page.has_more,
            "Listed items"
        );
        Ok(page)
    }

    #[instrument(skip(self, req), fields(subsystem = "client"))]
    async fn create(&self, req: CreateItemRequest) -> Result<Item> {
        let response = self
            .api
            .http()
            .post(self.api.url("items")?)
            .json(&req)
            .send()
            .await?;
        let item: Item = self.api.check("POST /items", response).await?.json().await?;
        debug!(item_id = %item.id, "Item created");
        Ok(item)
    }

    #[instrument(skip(self, req), fields(subsystem = "client"))]
    async fn update(&self, id: Uuid, req: UpdateItemRequest) -> Result<Item> {
        let response = self
            .api
            .http()
            .patch(self.api.url(&format!("items/{}", id))?)
            .json(&req)
            .send()
            .await?;
        let response = self
            .api
            .check("PATCH /items/{id}", response)
            .await
            .map_err(item_not_found(id))?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self), fields(subsystem = "client"))]
    async fn delete(&self, id: Uuid) -> Result<()> {
        let response = self
            .api
            .http()
            .delete(self.api.url(&format!("items/{}", id))?)
            .send()
            .await?;
        self.api
            .check("DELETE /items/{id}", response)
            .await
            .map_err(item_not_found(id))?;
        debug!(item_id = %id, "Item deleted");
        Ok(())
    }
}
