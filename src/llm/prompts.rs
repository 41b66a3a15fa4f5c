//! Prompt templates for the two model calls.

/// Instruction for turning a question into one SQLite statement.
const SQL_PROMPT: &str = "\
You are a SQLite expert. Given an input question, create a syntactically correct SQLite query.
Return only the raw SQL query, nothing else.

Only use the following tables:
{table_info}

Ensure the query fully qualifies column names (i.e., include table names or aliases as prefixes) to avoid ambiguity.

Unless specified, limit to {top_k} results.

Question: {input}
";

/// Instruction for phrasing a query result as prose.
const ANSWER_PROMPT: &str = "\
Based on the following information, provide a clear answer to the question:
Original Question: {question}
SQL Query Used: {query}
Query Result: {result}
Please provide a natural language answer:";

/// Build the query-synthesis prompt.
pub fn sql_prompt(table_info: &str, top_k: usize, question: &str) -> String {
    fill(
        SQL_PROMPT,
        &[
            ("table_info", table_info),
            ("top_k", &top_k.to_string()),
            ("input", question),
        ],
    )
}

/// Build the answer prompt.
pub fn answer_prompt(question: &str, query: &str, result: &str) -> String {
    fill(
        ANSWER_PROMPT,
        &[("question", question), ("query", query), ("result", result)],
    )
}

/// Substitute `{name}` slots in one pass, so values are never re-scanned.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after
            .find('}')
            .and_then(|close| values.iter().find(|(k, _)| *k == &after[..close]).map(|v| (close, v.1)));

        match slot {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
