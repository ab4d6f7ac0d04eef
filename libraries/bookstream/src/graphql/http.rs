use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::GatewayError;
use crate::data_model::{Book, BookId};
use crate::gateway::Gateway;
use crate::graphql::GatewayConfig;
use crate::graphql::operations::*;

/// Queries and mutations against the real server, over HTTP.
#[derive(Clone, Debug)]
pub struct GraphqlGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl GraphqlGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn execute<V, D>(&self, document: &str, variables: Option<V>) -> Result<D, GatewayError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        if OperationKind::of(document).is_some_and(|kind| kind.uses_duplex_channel()) {
            return Err(GatewayError::Transport(
                "subscriptions cannot be sent over the request/response channel".to_string(),
            ));
        }

        let mut request = self.client.post(&self.config.http_url).json(&Request {
            query: document,
            variables,
        });
        if let Some(bearer) = self.config.bearer() {
            request = request.header(reqwest::header::AUTHORIZATION, bearer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        // GraphQL servers often put validation errors in a 400 body, so try the envelope before looking at the status.
        match serde_json::from_str::<Response<D>>(&body) {
            Ok(parsed) => parsed.into_result(),
            Err(_) if !status.is_success() => Err(GatewayError::Transport(format!(
                "server answered {status}"
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

impl Gateway for GraphqlGateway {
    async fn books(&self) -> Result<Vec<Book>, GatewayError> {
        let data: BooksData = self.execute(GET_BOOKS, None::<()>).await?;
        Ok(data.books)
    }

    async fn add_book(&self, title: &str, author: &str) -> Result<Book, GatewayError> {
        let data: AddBookData = self
            .execute(ADD_BOOK, Some(AddBookVariables { title, author }))
            .await?;
        Ok(data.add_book)
    }

    async fn update_book(
        &self,
        id: &BookId,
        title: Option<&str>,
        author: Option<&str>,
    ) -> Result<Book, GatewayError> {
        let data: UpdateBookData = self
            .execute(UPDATE_BOOK, Some(UpdateBookVariables { id, title, author }))
            .await?;
        Ok(data.update_book)
    }

    async fn delete_book(&self, id: &BookId) -> Result<bool, GatewayError> {
        let data: DeleteBookData = self
            .execute(DELETE_BOOK, Some(DeleteBookVariables { id }))
            .await?;
        Ok(data.delete_book)
    }
}
