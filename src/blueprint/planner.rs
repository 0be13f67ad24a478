use std::collections::BTreeMap;

use serde::Serialize;

use crate::blueprint::model::{Catalog, Variant, title_case};

/// Raw resource id -> quantity, ordered by id.
pub type Totals = BTreeMap<String, u64>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResourceLine {
    pub id: String,
    pub name: String,
    pub quantity: u64,
    pub location: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RequirementLine {
    Resource(ResourceLine),
    Intermediate {
        id: String,
        name: String,
        quantity: u64,
        components: Vec<ResourceLine>,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BlueprintDetail {
    pub id: String,
    pub name: String,
    pub variant: String,
    pub medium: String,
    pub required: Vec<RequirementLine>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub intermediates: Vec<ListingEntry>,
    pub equipment: Vec<ListingEntry>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResourceRow {
    pub id: String,
    pub name: String,
    pub location: String,
    pub required: u64,
    pub collected: u64,
}

/// Sums the raw resources needed to build every queued blueprint once.
pub fn compute_totals<'a>(catalog: &Catalog, queue: impl IntoIterator<Item = &'a str>) -> Totals {
    let mut totals = Totals::new();
    let mut path = Vec::new();
    for id in queue {
        accumulate(catalog, id, 1, &mut path, &mut totals);
    }
    totals
}

/// Raw resources for `multiplier` builds of a single blueprint.
pub fn expand(catalog: &Catalog, id: &str, multiplier: u64) -> Totals {
    let mut totals = Totals::new();
    accumulate(catalog, id, multiplier, &mut Vec::new(), &mut totals);
    totals
}

fn accumulate(
    catalog: &Catalog,
    id: &str,
    multiplier: u64,
    path: &mut Vec<String>,
    totals: &mut Totals,
) {
    let Some(blueprint) = catalog.blueprint(id) else {
        tracing::debug!("Blueprint {} not in catalog, nothing to expand", id);
        return;
    };

    if path.iter().any(|seen| seen == id) {
        tracing::warn!("Blueprint {} requires itself via {:?}, skipping", id, path);
        return;
    }
    path.push(id.to_string());

    for requirement in &blueprint.required {
        if requirement.item.is_empty() {
            continue;
        }
        let quantity = requirement.quantity.saturating_mul(multiplier);

        if catalog.is_intermediate_item(&requirement.item) {
            accumulate(catalog, &requirement.item, quantity, path, totals);
        } else {
            let total = totals.entry(requirement.item.clone()).or_insert(0);
            *total = total.saturating_add(quantity);
        }
    }

    path.pop();
}

pub fn detail(catalog: &Catalog, id: &str) -> Option<BlueprintDetail> {
    let blueprint = catalog.blueprint(id)?;

    let required = blueprint
        .required
        .iter()
        .filter(|req| !req.item.is_empty())
        .map(|req| {
            if catalog.is_intermediate_item(&req.item) {
                RequirementLine::Intermediate {
                    id: req.item.clone(),
                    name: catalog.blueprint_name(&req.item),
                    quantity: req.quantity,
                    components: resource_lines(catalog, expand(catalog, &req.item, req.quantity)),
                }
            } else {
                RequirementLine::Resource(resource_line(catalog, &req.item, req.quantity))
            }
        })
        .collect();

    Some(BlueprintDetail {
        id: id.to_string(),
        name: catalog.blueprint_name(id),
        variant: title_case(blueprint.variant.as_str()),
        medium: title_case(&blueprint.medium),
        required,
    })
}

/// Blueprints that can be queued, grouped by variant and sorted by name.
pub fn listing(catalog: &Catalog) -> Listing {
    let mut listing = Listing::default();

    for (id, blueprint) in &catalog.blueprints {
        let entry = ListingEntry {
            id: id.clone(),
            name: catalog.blueprint_name(id),
        };
        match blueprint.variant {
            Variant::Intermediate => listing.intermediates.push(entry),
            Variant::Equipment => listing.equipment.push(entry),
            Variant::Other(_) => {}
        }
    }

    let by_name = |a: &ListingEntry, b: &ListingEntry| a.name.cmp(&b.name).then(a.id.cmp(&b.id));
    listing.intermediates.sort_by(by_name);
    listing.equipment.sort_by(by_name);
    listing
}

pub fn resource_rows(
    catalog: &Catalog,
    totals: &Totals,
    collected: impl Fn(&str) -> u64,
) -> Vec<ResourceRow> {
    totals
        .iter()
        .map(|(id, required)| ResourceRow {
            id: id.clone(),
            name: catalog.resource_name(id),
            location: catalog.resource_location(id),
            required: *required,
            collected: collected(id),
        })
        .collect()
}

fn resource_lines(catalog: &Catalog, totals: Totals) -> Vec<ResourceLine> {
    totals
        .into_iter()
        .map(|(id, quantity)| resource_line(catalog, &id, quantity))
        .collect()
}

fn resource_line(catalog: &Catalog, id: &str, quantity: u64) -> ResourceLine {
    ResourceLine {
        id: id.to_string(),
        name: catalog.resource_name(id),
        quantity,
        location: catalog.resource_location(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::model::{Blueprint, Requirement, Resource};
    use std::collections::HashMap;

    fn req(item: &str, quantity: u64) -> Requirement {
        Requirement {
            item: item.to_string(),
            quantity,
        }
    }

    fn blueprint(name: &str, variant: Variant, required: Vec<Requirement>) -> Blueprint {
        Blueprint {
            name: name.to_string(),
            variant,
            medium: "fabricator".to_string(),
            required,
        }
    }

    fn catalog() -> Catalog {
        let blueprints = HashMap::from([
            (
                "wire".to_string(),
                blueprint("Wire", Variant::Intermediate, vec![req("copper", 2)]),
            ),
            (
                "circuit".to_string(),
                blueprint(
                    "Circuit",
                    Variant::Intermediate,
                    vec![req("wire", 3), req("silicon", 1)],
                ),
            ),
            (
                "scanner".to_string(),
                blueprint(
                    "Scanner",
                    Variant::Equipment,
                    vec![req("circuit", 2), req("copper", 5), req("glass", 1)],
                ),
            ),
            (
                "armor".to_string(),
                blueprint("Armor", Variant::Equipment, vec![req("iron", 10), req("wire", 1)]),
            ),
        ]);
        let resources = HashMap::from([
            (
                "copper".to_string(),
                Resource {
                    name: "Copper".to_string(),
                    location: "junk_planetoid".to_string(),
                },
            ),
            (
                "iron".to_string(),
                Resource {
                    name: "Iron".to_string(),
                    location: "asteroid".to_string(),
                },
            ),
        ]);
        Catalog::new(blueprints, resources)
    }

    #[test]
    fn test_totals_expand_nested_intermediates() {
        let totals = compute_totals(&catalog(), ["scanner"]);

        // 2 circuits * 3 wire * 2 copper + 5 copper
        assert_eq!(totals.get("copper"), Some(&17));
        assert_eq!(totals.get("silicon"), Some(&2));
        assert_eq!(totals.get("glass"), Some(&1));
        assert!(!totals.contains_key("circuit"));
        assert!(!totals.contains_key("wire"));
    }

    #[test]
    fn test_totals_sum_across_queue() {
        let totals = compute_totals(&catalog(), ["scanner", "armor"]);

        assert_eq!(totals.get("copper"), Some(&19));
        assert_eq!(totals.get("iron"), Some(&10));
        assert_eq!(
            totals.keys().collect::<Vec<_>>(),
            vec!["copper", "glass", "iron", "silicon"]
        );
    }

    #[test]
    fn test_totals_ignore_unknown_and_empty() {
        let mut catalog = catalog();
        catalog.blueprints.insert(
            "odd".to_string(),
            blueprint("Odd", Variant::default(), vec![req("", 4), req("iron", 0)]),
        );

        let totals = compute_totals(&catalog, ["missing", "odd"]);

        assert_eq!(totals.len(), 1);
        assert_eq!(totals.get("iron"), Some(&0));
    }

    #[test]
    fn test_totals_survive_cycles() {
        let mut catalog = catalog();
        catalog.blueprints.insert(
            "a".to_string(),
            blueprint("A", Variant::Intermediate, vec![req("b", 1), req("iron", 1)]),
        );
        catalog.blueprints.insert(
            "b".to_string(),
            blueprint("B", Variant::Intermediate, vec![req("a", 2), req("copper", 3)]),
        );

        let totals = compute_totals(&catalog, ["a"]);

        assert_eq!(totals.get("iron"), Some(&1));
        assert_eq!(totals.get("copper"), Some(&3));
    }

    #[test]
    fn test_totals_saturate() {
        let mut catalog = catalog();
        catalog.blueprints.insert(
            "ingot".to_string(),
            blueprint("Ingot", Variant::Intermediate, vec![req("iron", u64::MAX)]),
        );
        catalog.blueprints.insert(
            "hull".to_string(),
            blueprint("Hull", Variant::Equipment, vec![req("ingot", 3), req("iron", 5)]),
        );

        let totals = compute_totals(&catalog, ["hull", "armor"]);

        assert_eq!(totals.get("iron"), Some(&u64::MAX));
        assert_eq!(expand(&catalog, "ingot", 2).get("iron"), Some(&u64::MAX));
    }

    #[test]
    fn test_detail_keeps_unknown_variant_name() {
        let mut catalog = catalog();
        catalog.blueprints.insert(
            "hat".to_string(),
            blueprint("Hat", Variant::Other("cosmetic".to_string()), vec![req("iron", 1)]),
        );
        catalog
            .blueprints
            .insert("blank".to_string(), blueprint("Blank", Variant::default(), vec![]));

        assert_eq!(super::detail(&catalog, "hat").unwrap().variant, "Cosmetic");
        assert_eq!(super::detail(&catalog, "blank").unwrap().variant, "");
        assert!(listing(&catalog).equipment.iter().all(|e| e.id != "hat"));
    }

    #[test]
    fn test_shared_intermediate_counted_per_use() {
        let totals = expand(&catalog(), "armor", 2);

        assert_eq!(totals.get("iron"), Some(&20));
        assert_eq!(totals.get("copper"), Some(&4));
    }

    #[test]
    fn test_detail_lines() {
        let detail = detail(&catalog(), "scanner").unwrap();

        assert_eq!(detail.name, "Scanner");
        assert_eq!(detail.variant, "Equipment");
        assert_eq!(detail.medium, "Fabricator");
        assert_eq!(detail.required.len(), 3);

        match &detail.required[0] {
            RequirementLine::Intermediate {
                id,
                quantity,
                components,
                ..
            } => {
                assert_eq!(id, "circuit");
                assert_eq!(*quantity, 2);
                assert_eq!(components.len(), 2);
                assert_eq!(components[0].id, "copper");
                assert_eq!(components[0].quantity, 12);
                assert_eq!(components[0].location, "Junk Planetoid");
            }
            other => panic!("expected intermediate line, got {:?}", other),
        }

        match &detail.required[2] {
            RequirementLine::Resource(line) => {
                assert_eq!(line.name, "glass");
                assert_eq!(line.location, "Unknown");
            }
            other => panic!("expected resource line, got {:?}", other),
        }

        assert!(super::detail(&catalog(), "missing").is_none());
    }

    #[test]
    fn test_listing_groups_and_sorts() {
        let listing = listing(&catalog());

        let names = |entries: &[ListingEntry]| {
            entries.iter().map(|e| e.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&listing.intermediates), vec!["Circuit", "Wire"]);
        assert_eq!(names(&listing.equipment), vec!["Armor", "Scanner"]);
    }

    #[test]
    fn test_resource_rows() {
        let catalog = catalog();
        let totals = compute_totals(&catalog, ["armor"]);
        let rows = resource_rows(&catalog, &totals, |id| if id == "iron" { 4 } else { 0 });

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, "iron");
        assert_eq!(rows[1].location, "Asteroid");
        assert_eq!(rows[1].required, 10);
        assert_eq!(rows[1].collected, 4);
    }
}
