use encoding_rs::Encoding;
use http::header::{self, HeaderMap};

use crate::params::parse_params;

const FORM_DATA: &str = "form-data";
const ATTACHMENT: &str = "attachment";

pub(crate) struct ContentDisposition {
    pub(crate) field_name: Option<String>,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    pub fn parse(headers: &HeaderMap, encoding: &'static Encoding) -> ContentDisposition {
        let value = match headers.get(header::CONTENT_DISPOSITION) {
            Some(value) => encoding.decode_without_bom_handling(value.as_bytes()).0,
            None => {
                return ContentDisposition {
                    field_name: None,
                    file_name: None,
                }
            }
        };

        let kind = value.trim_start().to_ascii_lowercase();
        let is_form_data = kind.starts_with(FORM_DATA);
        let is_attachment = kind.starts_with(ATTACHMENT);

        if !is_form_data && !is_attachment {
            return ContentDisposition {
                field_name: None,
                file_name: None,
            };
        }

        let mut params = parse_params(&value, &[';', ','], true);

        let field_name = if is_form_data {
            params
                .remove("name")
                .flatten()
                .map(|name| name.trim().to_owned())
        } else {
            None
        };

        // A present but empty `filename` marks a file input left empty.
        let file_name = params
            .remove("filename")
            .map(|name| name.map(|name| name.trim().to_owned()).unwrap_or_default());

        ContentDisposition { field_name, file_name }
    }
}
