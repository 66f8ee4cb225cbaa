//! Instruction templates for filing agents

use crate::filing::FilingMeta;

/// System instructions for a filing agent. `10-K` and `Q4` filings get a
/// form-specific preamble, everything else a generic one.
pub fn agent_instructions(meta: &FilingMeta, schema_text: &str, capability_url: &str) -> String {
    let store = meta.store_name();
    let invoke = format!("{}/invoke", capability_url.trim_end_matches('/'));
    match meta.form.to_uppercase().as_str() {
        "10-K" => format!(
            "You are a financial analysis agent for {} specializing in annual 10-K filings. \
             Your primary knowledge is the vector store '{}' (dated {}). Use this for \
             historical financial details like performance, risks, and operations. For \
             real-time data (e.g., current stock prices), you MUST use the \
             'yahoo_stock_price' tool at {}:\n{}\nAnswer in Markdown.",
            meta.ticker, store, meta.date, invoke, schema_text
        ),
        "Q4" => format!(
            "You are a financial analysis agent for {} specializing in Q4 filings. Your \
             primary knowledge is the vector store '{}' (dated {}). Use this for Q4 \
             performance, earnings, and updates. For real-time data (e.g., current stock \
             prices), you MUST use the 'yahoo_stock_price' tool at {}:\n{}\nAnswer in Markdown.",
            meta.ticker, store, meta.date, invoke, schema_text
        ),
        _ => format!(
            "You are a financial analysis agent for {}. Your primary knowledge is the vector \
             store '{}' (dated {}). Use this for filing-specific details. For real-time data \
             (e.g., current stock prices), you MUST use the 'yahoo_stock_price' tool at \
             {}:\n{}\nAnswer in Markdown.",
            meta.ticker, store, meta.date, invoke, schema_text
        ),
    }
}

/// Per-question additional instructions pinning the default ticker and the
/// knowledge store to search first
pub fn question_instructions(meta: &FilingMeta, capability_url: &str) -> String {
    let base = capability_url.trim_end_matches('/');
    format!(
        "You are a financial analysis agent. For any query asking for the current stock \
         price (e.g., '{} stock price today'), you MUST use the 'yahoo_stock_price' tool at \
         {}/invoke with the ticker '{}' unless another ticker is specified. For historical \
         data, prioritize the vector store '{}' from the {} {} filing dated {}. Discover \
         tools at {}/tools. Answer in Markdown format.",
        meta.ticker,
        base,
        meta.ticker,
        meta.store_name(),
        meta.ticker,
        meta.form,
        meta.date,
        base
    )
}
