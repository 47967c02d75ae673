//! MCP service implementation using rmcp.
//!
//! [`ExplorerService`] exposes the schema explorer's four tools. Each call
//! builds what it needs from the shared [`Explorer`]; nothing is cached
//! between calls.

use crate::explorer::Explorer;
use crate::tools::{
    GetRelationshipsInput, GetRelationshipsOutput, GetSchemaInput, GetSchemaOutput, QueryInput,
    QueryOutput, QueryToolHandler, RelationshipToolHandler, SchemaToolHandler, SearchInput,
    SearchOutput, SearchToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ExplorerService {
    explorer: Arc<Explorer>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl ExplorerService {
    pub fn new(explorer: Arc<Explorer>) -> Self {
        Self {
            explorer,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl ExplorerService {
    #[tool(
        description = "Get the schema catalog: every table with its kind (base, data, revision, revision_data, field_data, field_revision, other), owning entity type and field, and columns.\nAlso lists entity types with their storage tables and bundles.\nFilter with entity_type; set tables_only to omit columns."
    )]
    async fn get_schema(
        &self,
        Parameters(input): Parameters<GetSchemaInput>,
    ) -> Result<Json<GetSchemaOutput>, McpError> {
        SchemaToolHandler::new(self.explorer.clone())
            .get_schema(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }

    #[tool(
        description = "Get the table relationship graph.\nEdges: base_to_data, base_to_revision, revision_to_data, entity_to_field, revision_to_field.\nFilter with entity_type and bundle. Tables without an entity type owner are not included."
    )]
    async fn get_relationships(
        &self,
        Parameters(input): Parameters<GetRelationshipsInput>,
    ) -> Result<Json<GetRelationshipsOutput>, McpError> {
        RelationshipToolHandler::new(self.explorer.clone())
            .get_relationships(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }

    #[tool(
        description = "Search the database for a term (case-insensitive).\ntype \"value\" (default) scans text columns of every table and returns up to `limit` matching rows per table; tables that fail or time out are skipped.\ntype \"field\" matches table and column names."
    )]
    async fn search(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<Json<SearchOutput>, McpError> {
        SearchToolHandler::new(self.explorer.clone())
            .search(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }

    #[tool(
        description = "Execute a read-only SELECT query and return rows.\nThe statement must start with SELECT. Any statement containing DROP, DELETE, UPDATE, INSERT, ALTER, CREATE or TRUNCATE is rejected, even inside identifiers or strings.\nDefault limit 100 rows (max 10000)."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<Json<QueryOutput>, McpError> {
        QueryToolHandler::new(self.explorer.clone())
            .query(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }
}

#[tool_handler]
impl ServerHandler for ExplorerService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "schema-explorer".to_owned(),
                title: Some("Schema Explorer".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for exploring the relational schema behind an entity-oriented application.\n\
                \n\
                ## Workflow\n\
                1. Call `get_schema` to see tables, columns and which entity type owns each table\n\
                2. Call `get_relationships` to see how base, data, revision and field tables connect\n\
                3. Use `search` to find where a value or a column name lives\n\
                4. Use `query` to read rows with a SELECT statement\n\
                \n\
                ## Query Rules\n\
                - Only SELECT statements are accepted\n\
                - The keywords DROP, DELETE, UPDATE, INSERT, ALTER, CREATE and TRUNCATE are rejected anywhere in the text"
                    .to_string(),
            ),
        }
    }
}
