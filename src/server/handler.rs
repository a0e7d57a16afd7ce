use crate::tools::bibliography::BibliographyInput;
use crate::tools::search::{SearchInput, SearchResult};
use crate::tools::summarize::{BatchSummarizeInput, SummarizeAllInput, SummarizeInput};
use crate::{AppContext, BibliographyTool, Error, SearchTool, SummarizeTool};
use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, JsonObject, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
    ErrorData, ServerHandler,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const INSTRUCTIONS: &str = "Search arXiv, read papers and summarize them at three depths: \
1 = quick overview from the abstract, 2 = technical digest of the full text, \
3 = comprehensive review of the full text (levels 2 and 3 need the arXiv id). \
Search results can be passed straight to batch_summarize and export_bibtex.";

/// MCP server handler exposing the research tools
#[derive(Debug, Clone)]
pub struct ResearchServerHandler {
    search_tool: SearchTool,
    summarize_tool: SummarizeTool,
    bibliography_tool: BibliographyTool,
}

impl ResearchServerHandler {
    /// Create a handler over an assembled application context
    pub fn new(context: &AppContext) -> Self {
        info!("Initializing research MCP server handler");
        Self {
            search_tool: context.search_tool.clone(),
            summarize_tool: context.summarize_tool.clone(),
            bibliography_tool: context.bibliography_tool.clone(),
        }
    }

    /// Tool descriptors advertised to clients
    pub fn tools() -> Result<Vec<Tool>, ErrorData> {
        Ok(vec![
            Tool::new(
                "search_papers",
                "Search arXiv for papers matching a free-text query",
                input_schema::<SearchInput>()?,
            ),
            Tool::new(
                "summarize_paper",
                "Summarize a paper at detail level 1 (abstract overview), 2 (technical digest) or 3 (comprehensive review)",
                input_schema::<SummarizeInput>()?,
            ),
            Tool::new(
                "summarize_all_levels",
                "Summarize a paper at all three detail levels",
                input_schema::<SummarizeAllInput>()?,
            ),
            Tool::new(
                "batch_summarize",
                "Summarize up to 20 papers from a search result at one detail level",
                input_schema::<BatchSummarizeInput>()?,
            ),
            Tool::new(
                "export_bibtex",
                "Export paper records as BibTeX entries and a complete .bib file",
                input_schema::<BibliographyInput>()?,
            ),
        ])
    }

    /// Run one tool call; shared by the MCP entry point and tests
    #[instrument(skip(self, arguments))]
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = arguments.unwrap_or_default();

        match name {
            "search_papers" => {
                let input: SearchInput = parse_arguments(name, arguments)?;
                let result = self.search_tool.search_papers(input).await.map_err(to_error_data)?;
                Ok(text_result(format_search_result(&result)))
            }
            "summarize_paper" => {
                let input: SummarizeInput = parse_arguments(name, arguments)?;
                let result = self.summarize_tool.summarize(input).await.map_err(to_error_data)?;
                Ok(text_result(result.summary))
            }
            "summarize_all_levels" => {
                let input: SummarizeAllInput = parse_arguments(name, arguments)?;
                let result = self
                    .summarize_tool
                    .summarize_all_levels(input)
                    .await
                    .map_err(to_error_data)?;
                json_result(&result)
            }
            "batch_summarize" => {
                let input: BatchSummarizeInput = parse_arguments(name, arguments)?;
                let result = self
                    .summarize_tool
                    .batch_summarize(input)
                    .await
                    .map_err(to_error_data)?;
                json_result(&result)
            }
            "export_bibtex" => {
                let input: BibliographyInput = parse_arguments(name, arguments)?;
                let result = self.bibliography_tool.export(&input).map_err(to_error_data)?;
                Ok(text_result(result.bibliography))
            }
            _ => Err(ErrorData::invalid_request(format!("Unknown tool: {name}"), None)),
        }
    }
}

fn input_schema<T: JsonSchema>() -> Result<Arc<JsonObject>, ErrorData> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(serde_json::Value::Object(object)) => Ok(Arc::new(object)),
        Ok(_) => Err(ErrorData::internal_error("tool schema is not an object", None)),
        Err(e) => Err(ErrorData::internal_error(
            format!("failed to serialize tool schema: {e}"),
            None,
        )),
    }
}

fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: JsonObject) -> Result<T, ErrorData> {
    serde_json::from_value(serde_json::Value::Object(arguments))
        .map_err(|e| ErrorData::invalid_params(format!("Invalid {tool} input: {e}"), None))
}

fn to_error_data(error: Error) -> ErrorData {
    if error.is_caller_error() {
        debug!("Rejected tool input: {}", error);
        ErrorData::invalid_params(error.to_string(), None)
    } else {
        warn!("Tool call failed: {}", error);
        ErrorData::internal_error(error.to_string(), None)
    }
}

fn text_result(text: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text)])
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    serde_json::to_string_pretty(value)
        .map(text_result)
        .map_err(|e| ErrorData::internal_error(format!("Serialization failed: {e}"), None))
}

fn format_search_result(result: &SearchResult) -> String {
    let listing = result
        .papers
        .iter()
        .map(|paper| {
            format!(
                "• [{}] {} ({})\n  {}",
                paper.id,
                paper.title,
                paper.authors.join(", "),
                paper.abs_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let records = serde_json::to_string(&result.papers).unwrap_or_default();
    format!(
        "Found {} papers for '{}'\n\n{}\n\nRecords:\n{}",
        result.count, result.query, listing, records
    )
}

impl ServerHandler for ResearchServerHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        debug!("Listing available tools");

        async move {
            Ok(ListToolsResult {
                tools: Self::tools()?,
                next_cursor: None,
            })
        }
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        info!("Tool called: {}", request.name);
        async move { self.dispatch(&request.name, request.arguments).await }
    }
}
