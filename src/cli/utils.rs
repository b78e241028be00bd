use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

/// Print a result: the message in text mode, message plus `data` fields in
/// JSON mode.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "message": message });
            if let (Some(target), Some(Value::Object(fields))) = (response.as_object_mut(), data) {
                target.extend(fields);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print one item per line in text mode.
pub fn output_list(output_format: &OutputFormat, message: &str, key: &str, items: &[String]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut data = Map::new();
            data.insert(key.to_string(), json!(items));
            output_success(output_format, message, Some(Value::Object(data)))
        }
        OutputFormat::Text => {
            println!("{}", message);
            for item in items {
                println!("  {}", item);
            }
            Ok(())
        }
    }
}
