//! Parameter synthesis for content-item property and filter actions.
//!
//! The vendor data leaves these actions without the parameters the editor
//! needs ("Get <property>", filter/sort/limit). They are derived from the
//! coercion type table.

use serde_json::json;

use crate::spec::{Catalog, ParameterSpec, TypeTable};

const PROPERTIES_ACTION: &str = "WFContentItemPropertiesAction";
const FILTER_ACTION: &str = "WFContentItemFilterAction";

const SORT_ORDERS: &[&str] = &[
    "Oldest First",
    "Newest First",
    "Latest First",
    "Smallest First",
    "Biggest First",
    "Ascending",
    "Descending",
    "Shortest First",
    "Longest First",
    "A to Z",
    "Z to A",
];

/// Counts of what [`synthesize_content_item_parameters`] touched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisReport {
    /// Property actions given a `WFContentItemPropertyName` enumeration.
    pub property_actions: usize,
    /// Property actions whose class has no coercion type.
    pub undefined_coercions: usize,
    /// Filter actions given filter/sort/limit parameters.
    pub filter_actions: usize,
    /// Filter actions left alone because their class has no coercion type.
    pub skipped_filters: usize,
}

pub fn synthesize_content_item_parameters(
    catalog: &mut Catalog,
    types: &TypeTable,
) -> SynthesisReport {
    let mut report = SynthesisReport::default();

    for (_, action) in catalog.iter_mut() {
        let is_properties = action.action_class.as_deref() == Some(PROPERTIES_ACTION);
        let is_filter = action.action_class.as_deref() == Some(FILTER_ACTION);
        if !is_properties && !is_filter {
            continue;
        }

        let names = action
            .content_item_class
            .as_deref()
            .and_then(|class| types.property_names(class));
        let class = action.content_item_class.clone().unwrap_or_default();
        let params = action.parameters.get_or_insert_with(Vec::new);

        match (is_properties, names) {
            (true, Some(names)) => {
                params.push(
                    ParameterSpec::new("WFEnumerationParameter", "WFContentItemPropertyName")
                        .label("Get")
                        .items(names),
                );
                report.property_actions += 1;
            }
            (true, None) => {
                params.push(ParameterSpec::new(
                    "_UndefinedCoercionClass",
                    "_UndefinedCoercion",
                ));
                report.undefined_coercions += 1;
            }
            (false, Some(names)) => {
                params.extend(filter_parameters(&class, names));
                report.filter_actions += 1;
            }
            (false, None) => report.skipped_filters += 1,
        }
    }

    report
}

fn filter_parameters(class: &str, property_names: Vec<String>) -> Vec<ParameterSpec> {
    let mut sort_properties = property_names;
    sort_properties.push("Random".to_string());

    vec![
        ParameterSpec::new("WFFilterParameter", "WFContentItemFilter")
            .label("Filter")
            .content_item_class(class),
        ParameterSpec::new("WFEnumerationParameter", "WFContentItemSortProperty")
            .label("Sort by")
            .items(sort_properties),
        ParameterSpec::new("WFEnumerationParameter", "WFContentItemSortOrder")
            .label("Order")
            .items(SORT_ORDERS.iter().copied())
            .required_resources(vec![json!({
                "WFParameterKey": "WFContentItemSortProperty",
                "WFParameterValues": ["Random"],
                "WFResourceClass": "WFParameterRelationResource",
                "WFParameterRelation": "!="
            })]),
        ParameterSpec::new("WFSwitchParameter", "WFContentItemLimitEnabled").label("Limit"),
        ParameterSpec::new("WFStepperParameter", "WFContentItemLimitNumber")
            .label("Get Items")
            .required_resources(vec![json!({
                "WFParameterKey": "WFSwitchParameter",
                "WFParameterValues": [true],
                "WFResourceClass": "WFParameterRelationResource"
            })]),
    ]
}
