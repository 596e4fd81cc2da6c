use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use serde::Deserialize;

use crate::error::LookupError;

/// DNS query type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
	#[default]
	A,
	AAAA,
}

impl From<QueryType> for RecordType {
	fn from(query_type: QueryType) -> Self {
		match query_type {
			QueryType::A => RecordType::A,
			QueryType::AAAA => RecordType::AAAA,
		}
	}
}

/// DNS response information extracted from a parsed message
#[derive(Debug)]
pub struct DnsResponse {
	pub rcode: ResponseCode,
	pub answer_count: usize,
}

/// Build a recursion-desired DNS query for the given domain and query type.
///
/// The domain is treated as fully qualified whether or not it carries the
/// trailing dot. Returns the serialized query bytes.
pub fn build_query(domain: &str, query_type: QueryType, txid: u16) -> Result<Vec<u8>, LookupError> {
	let fqdn = if domain.ends_with('.') {
		domain.to_string()
	} else {
		format!("{}.", domain)
	};
	let name = Name::from_ascii(&fqdn)
		.map_err(|e| LookupError::InvalidDomain {
			domain: domain.to_string(),
			reason: e.to_string(),
		})?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, query_type.into()));

	message.to_vec()
		.map_err(|e| LookupError::Malformed(format!("failed to serialize DNS query: {}", e)))
}

/// Parse a DNS response, validating the transaction ID and extracting the rcode.
///
/// Returns an error if the response cannot be parsed, is not a response, or
/// the txid does not match.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<DnsResponse, LookupError> {
	let message = Message::from_vec(bytes)
		.map_err(|e| LookupError::Malformed(e.to_string()))?;

	if message.id() != expected_txid {
		return Err(LookupError::TxidMismatch {
			expected: expected_txid,
			actual: message.id(),
		});
	}

	if message.message_type() != MessageType::Response {
		return Err(LookupError::Malformed("received a query instead of a response".to_string()));
	}

	Ok(DnsResponse {
		rcode: message.response_code(),
		answer_count: message.answer_count() as usize,
	})
}
