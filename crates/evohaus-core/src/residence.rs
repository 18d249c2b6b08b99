// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Evohaus Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Residence discovery from the consumption overview page

use crate::errors::{PortalError, PortalResult};
use crate::markup;
use once_cell::sync::Lazy;
use regex::Regex;

pub const OWN_CONSUMPTION_PATH: &str = "/php/ownConsumption.php";

static LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<label\b[^>]*>").expect("valid label regex"));

/// Identifier of the caller's residence (the portal's `AreaId`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residence {
    pub residence_id: String,
}

/// Find the residence id on the consumption overview page
///
/// The page renders a `<label for="residence">` with an
/// `<a class="pdm" id="...">` among its following siblings; that `id` is the
/// residence identifier. Anchors outside the label's parent element are not
/// considered.
pub fn parse_residence_id(html: &str) -> PortalResult<Residence> {
    let label = LABEL
        .find_iter(html)
        .find(|tag| markup::attribute(tag.as_str(), "for") == Some("residence"))
        .ok_or_else(|| PortalError::Parse("no <label for=\"residence\"> on page".to_owned()))?;

    let siblings = markup::rest_of_parent(html, label.start());
    let anchor = markup::anchor_tags(siblings)
        .find(|tag| markup::has_class(tag, "pdm"))
        .ok_or_else(|| {
            PortalError::Parse("no <a class=\"pdm\"> next to the residence label".to_owned())
        })?;

    let residence_id = markup::attribute(anchor, "id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PortalError::Parse("residence link has no id attribute".to_owned()))?;

    Ok(Residence {
        residence_id: residence_id.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <div class="form-group">
          <label for="period">Zeitraum</label>
          <a class="pdm" id="not-this-one">Tag</a>
        </div>
        <div class="form-group">
          <label class="control-label" for="residence">Wohnung</label>
          <div class="dropdown">
            <a href="#" class="btn pdm" id="1234">Whg. 12</a>
          </div>
        </div>"##;

    #[test]
    fn test_parse_residence_id() {
        let residence = parse_residence_id(PAGE).unwrap();
        assert_eq!(residence.residence_id, "1234");
    }

    #[test]
    fn test_missing_label_is_parse_error() {
        let result = parse_residence_id(r#"<a class="pdm" id="1234">x</a>"#);
        assert!(matches!(result, Err(PortalError::Parse(_))));
    }

    #[test]
    fn test_missing_anchor_is_parse_error() {
        let result = parse_residence_id(r#"<label for="residence">Wohnung</label><a id="1">x</a>"#);
        assert!(matches!(result, Err(PortalError::Parse(_))));
    }

    #[test]
    fn test_anchor_of_another_form_group_is_ignored() {
        let page = r#"
            <div class="form-group"><label for="residence">Wohnung</label></div>
            <div class="form-group">
              <label for="period">Zeitraum</label>
              <a class="pdm" id="day">Tag</a>
            </div>"#;
        let result = parse_residence_id(page);
        assert!(matches!(result, Err(PortalError::Parse(_))));
    }

    #[test]
    fn test_anchor_without_id_is_parse_error() {
        let result = parse_residence_id(r#"<label for="residence">W</label><a class="pdm">x</a>"#);
        assert!(matches!(result, Err(PortalError::Parse(_))));
    }
}
