//! Prompt text for the stock and crypto orchestrators
//!
//! Supervisor templates see `query`, `routes`, `visit_count`, `max_visits`
//! and `remaining`; worker templates see `query`, `category` and `tools`;
//! synthesis templates see `query`.

use agent_core::{Result, Route};
use agent_workflow::PromptTemplate;

use crate::domain::Domain;

const SUPERVISOR: &str = r"You are the lead {{ asset }} analyst coordinating a small team.

The user asked: {{ query }}

Available analysts:
{%- for r in routes %}
- {{ r }}: {% if r == 'technical' %}prices, quotes and technical indicators{% elif r == 'sentiment' %}{{ sentiment_scope }}{% else %}web research on news, events and fundamentals{% endif %}
{%- endfor %}

Analysts consulted so far: {{ visit_count }} of {{ max_visits }} ({{ remaining }} remaining).

Decide the single next step by calling the `route` tool.
- Route to an analyst only when their data is still missing and needed to answer.
- A simple price question needs only the technical analyst.
- A broad analysis usually needs technical, then sentiment, then research.
- Choose finish as soon as the collected data answers the question.
- Never route to the same analyst twice unless their previous attempt failed.";

const TECHNICAL: &str = r"You are the technical analyst on a {{ asset }} research team.

The user asked: {{ query }}

Use your tools ({{ tools | join(', ') }}) to gather what the question needs.
{{ symbol_hint }}
For a price question call get_quote only. For analysis call get_quote and
get_indicators with RSI, MACD, SMA and BBANDS in the same turn.
Call every tool you need in this single turn. If no tool fits, reply with a
short note explaining why.";

const SENTIMENT: &str = r"You are the sentiment analyst on a {{ asset }} research team.

The user asked: {{ query }}

Use your tools ({{ tools | join(', ') }}) to measure {{ sentiment_scope }}.
{{ symbol_hint }}
Call every tool you need in this single turn. If the question has nothing to
do with market mood, reply with a one-line note instead.";

const RESEARCH: &str = r"You are the research analyst on a {{ asset }} research team.

The user asked: {{ query }}

Use {{ tools | join(', ') }} to find recent news, events, filings and context
that explain the situation. Write focused search queries that name the asset.
Call every search you need in this single turn.";

const SYNTHESIS: &str = r"You are a senior {{ asset }} analyst writing the final answer.

The user asked: {{ query }}

Write a clear, direct answer from the collected data and analyst notes.
- Quote concrete numbers (prices, indicator values, sentiment scores) with their units.
- If a data point shows an error, say that it was unavailable; do not guess it.
- Answer in the language of the question.
- Do not mention analysts, routing, tools or internal steps.
- End with a one-line reminder that this is not financial advice.";

struct DomainText {
    asset: &'static str,
    sentiment_scope: &'static str,
    symbol_hint: &'static str,
}

fn text(domain: Domain) -> DomainText {
    match domain {
        Domain::Stock => DomainText {
            asset: "stock market",
            sentiment_scope: "news sentiment for the company",
            symbol_hint: "Use the exchange ticker (AAPL, TSLA, MSFT).",
        },
        Domain::Crypto => DomainText {
            asset: "cryptocurrency",
            sentiment_scope: "market-wide fear and greed",
            symbol_hint: "Use the coin ticker (BTC, ETH, SOL); the USD pair is implied.",
        },
    }
}

/// Substitute the domain words, leaving the run-time variables in place
fn specialize(name: &str, source: &str, domain: Domain) -> Result<PromptTemplate> {
    let t = text(domain);
    let source = source
        .replace("{{ asset }}", t.asset)
        .replace("{{ sentiment_scope }}", t.sentiment_scope)
        .replace("{{ symbol_hint }}", t.symbol_hint);
    PromptTemplate::new(format!("{}.{name}", domain.as_str()), source)
}

pub fn supervisor(domain: Domain) -> Result<PromptTemplate> {
    specialize("supervisor", SUPERVISOR, domain)
}

pub fn worker(domain: Domain, route: Route) -> Result<PromptTemplate> {
    match route {
        Route::Technical => specialize("technical", TECHNICAL, domain),
        Route::Sentiment => specialize("sentiment", SENTIMENT, domain),
        Route::Research => specialize("research", RESEARCH, domain),
        Route::Finish => Err(agent_core::Error::InitializationFailed(
            "finish has no worker prompt".to_string(),
        )),
    }
}

pub fn synthesis(domain: Domain) -> Result<PromptTemplate> {
    specialize("synthesis", SYNTHESIS, domain)
}
