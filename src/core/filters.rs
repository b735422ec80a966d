use std::collections::HashSet;

use serde_json::Value;

use crate::models::{CollegeCard, FetchReport, SkippedDocument};

/// Drop cards the user has already liked or disliked, keeping fetch order
#[inline]
pub fn exclude_decided(cards: Vec<CollegeCard>, decided: &HashSet<String>) -> Vec<CollegeCard> {
    if decided.is_empty() {
        return cards;
    }
    cards
        .into_iter()
        .filter(|card| !decided.contains(&card.id))
        .collect()
}

/// Id of a raw document, for skip reports
fn document_id(doc: &Value) -> String {
    doc.get("$id")
        .and_then(|id| id.as_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Decode one raw document into a card that honors the schema contract
pub fn decode_college(doc: &Value) -> Result<CollegeCard, SkippedDocument> {
    let data = doc.get("data").unwrap_or(doc);

    let card: CollegeCard = serde_json::from_value(data.clone()).map_err(|e| SkippedDocument {
        id: document_id(doc),
        reason: e.to_string(),
    })?;

    card.check_contract().map_err(|reason| SkippedDocument {
        id: card.id.clone(),
        reason,
    })?;

    Ok(card)
}

/// Decode a batch of documents, collecting failures instead of aborting
pub fn decode_college_documents(documents: &[Value]) -> FetchReport {
    let mut report = FetchReport::default();

    for doc in documents {
        match decode_college(doc) {
            Ok(card) => report.cards.push(card),
            Err(skipped) => report.skipped.push(skipped),
        }
    }

    report
}
