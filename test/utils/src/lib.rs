/// A chat response body as the server streams it: one debug record followed
/// by answer tokens, newline delimited.
pub fn chat_stream_fixture() -> &'static str {
    return r#"{"type": "debug", "data": {"context_sent_to_llm": "Invoice total: [REDACTED] EUR", "vector_matches": [{"filename": "invoice.pdf", "score": 0.8123}, {"filename": "contract.pdf", "score": 0.2011}]}}
{"type": "token", "content": "The invoice"}
{"type": "token", "content": " total is"}
{"type": "token", "content": " redacted."}
"#;
}

pub fn documents_fixture() -> &'static str {
    return r#"[
    {
        "id": "3f0c5a52-8a8e-4c55-9d8e-0b6f1f7d2a11",
        "filename": "invoice.pdf",
        "status": "completed",
        "risk_score": 120,
        "created_at": "2024-11-02T10:15:00"
    },
    {
        "id": "9b1d0f3e-2c4a-4e1b-8f55-7a3e6c2d9b40",
        "filename": "notes.pdf",
        "status": "processing",
        "created_at": "2024-11-02T10:16:30"
    }
]"#;
}

/// Splits `body` into chunks of `size` bytes, the way a server flushing a
/// fixed-size buffer would deliver it.
pub fn chunked(body: &str, size: usize) -> Vec<Vec<u8>> {
    return body
        .as_bytes()
        .chunks(size)
        .map(|chunk| return chunk.to_vec())
        .collect();
}
