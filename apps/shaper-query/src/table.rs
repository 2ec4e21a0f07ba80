use prettytable::{
	Cell, Row, Table,
	format::{FormatBuilder, LinePosition, LineSeparator, TableFormat},
};
use serde_json::Value;

use shaper_format::Bucket;

const MISSING: &str = "N/A";
const EVENT_COLUMNS: [(&str, &str); 6] = [
	("Event ID", "eventId"),
	("Module", "moduleId"),
	("Source", "eventSourceId"),
	("Date/Time", "eventDateTime"),
	("Status", "status"),
	("Task ID", "taskId"),
];

pub fn bucket_table(buckets: &[Bucket]) -> Table {
	let mut table = new_table(&["Key", "Doc Count"]);

	for bucket in buckets {
		let key = bucket.key().map(display_value).unwrap_or_else(|| MISSING.to_string());
		let doc_count =
			bucket.doc_count().map(|count| count.to_string()).unwrap_or_else(|| MISSING.to_string());

		table.add_row(Row::new(vec![Cell::new(&key), Cell::new(&doc_count)]));
	}

	table
}

/// One row per event. Hits without `eventData` still get a row so positions line up with the hit
/// list.
pub fn event_table(events: &[Option<&Value>]) -> Table {
	let titles: Vec<&str> = EVENT_COLUMNS.iter().map(|(title, _)| *title).collect();
	let mut table = new_table(&titles);

	for event in events {
		let cells = EVENT_COLUMNS
			.iter()
			.map(|(_, field)| {
				let text = event
					.and_then(|event| event.get(field))
					.filter(|value| !value.is_null())
					.map(display_value)
					.unwrap_or_else(|| MISSING.to_string());

				Cell::new(&text)
			})
			.collect();

		table.add_row(Row::new(cells));
	}

	table
}

fn new_table(titles: &[&str]) -> Table {
	let mut table = Table::new();

	table.set_format(table_format());

	let titles = titles.iter().map(|title| Cell::new(title).style_spec("bc")).collect();

	table.set_titles(Row::new(titles));

	table
}

fn table_format() -> TableFormat {
	FormatBuilder::new()
		.column_separator('│')
		.borders('│')
		.separators(&[LinePosition::Top], LineSeparator::new('─', '┬', '┌', '┐'))
		.separators(&[LinePosition::Title], LineSeparator::new('─', '┼', '├', '┤'))
		.separators(&[LinePosition::Bottom], LineSeparator::new('─', '┴', '└', '┘'))
		.padding(1, 1)
		.build()
}

fn display_value(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::{Value, json};

	use shaper_format::SearchResponse;
	use shaper_testkit::fixtures;

	use crate::table;

	#[test]
	fn bucket_table_lists_keys_and_counts_in_order() {
		let response = SearchResponse::from_value(fixtures::by_source_response())
			.expect("fixture must parse");
		let (_, buckets) = shaper_format::select_grouping(response.aggregations.as_ref())
			.expect("fixture has a grouping");
		let rendered = table::bucket_table(buckets).to_string();
		let office = rendered.find("cam-office-02").expect("office row");
		let livecam = rendered.find("cam-livecam-01").expect("livecam row");

		assert!(rendered.contains("Doc Count"));
		assert!(office < livecam, "rows must follow bucket order:\n{rendered}");
	}

	#[test]
	fn bucket_without_key_or_count_renders_placeholders() {
		let response = SearchResponse::from_value(json!({
			"hits": { "total": { "value": 0, "relation": "eq" }, "hits": [] },
			"aggregations": { "by_range": { "buckets": [{ "from": 10, "doc_count": -1 }] } }
		}))
		.expect("response must parse");
		let (_, buckets) = shaper_format::select_grouping(response.aggregations.as_ref())
			.expect("range buckets still group");
		let rendered = table::bucket_table(buckets).to_string();

		assert_eq!(rendered.matches("N/A").count(), 2, "unexpected table:\n{rendered}");
	}

	#[test]
	fn numeric_keys_render_without_quotes() {
		assert_eq!(table::display_value(&json!(75)), "75");
		assert_eq!(table::display_value(&json!("75")), "75");
	}

	#[test]
	fn event_table_marks_missing_fields() {
		let event = fixtures::event("evt-1", "cam-1");
		let partial = json!({ "eventId": "evt-2", "status": null });
		let events: Vec<Option<&Value>> = vec![Some(&event), None, Some(&partial)];
		let table = table::event_table(&events);
		let rendered = table.to_string();

		assert_eq!(table.len(), 3);
		assert!(rendered.contains("evt-1"));
		assert!(rendered.contains("CROWD_COUNT"));
		assert!(rendered.contains("evt-2"));
		assert!(rendered.contains("N/A"));
	}
}
