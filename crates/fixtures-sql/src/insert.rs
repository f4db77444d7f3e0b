use anyhow::Result;
use asset_graph::{Asset, Layout};

use crate::Dialect;

/// SQL string literal with embedded quotes doubled.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn tags_literal(tags: &[String], dialect: Dialect) -> Result<String> {
    Ok(match dialect {
        Dialect::Postgres if tags.is_empty() => "'{}'::text[]".to_string(),
        Dialect::Postgres => {
            let items: Vec<String> = tags.iter().map(|t| quote_literal(t)).collect();
            format!("ARRAY[{}]::text[]", items.join(","))
        }
        Dialect::Sqlite => quote_literal(&serde_json::to_string(tags)?),
    })
}

pub fn columns(layout: Layout) -> &'static str {
    match layout {
        Layout::Flat => "id, org_id, type, details",
        Layout::Graph => "id, org_id, type, parent_id, parent_type, details",
        Layout::Tagged => "id, org_id, type, parent_id, parent_type, details, tags",
    }
}

/// One `INSERT INTO assets` statement, terminated with `;`.
pub fn render_insert(asset: &Asset, layout: Layout, dialect: Dialect) -> Result<String> {
    let mut values = vec![
        quote_literal(&asset.id().to_string()),
        quote_literal(&asset.org_id().to_string()),
        quote_literal(asset.kind().as_str()),
    ];
    if layout.has_parents() {
        match asset.parent() {
            Some(p) => {
                values.push(quote_literal(&p.id.to_string()));
                values.push(quote_literal(p.kind.as_str()));
            }
            None => {
                values.push("NULL".to_string());
                values.push("NULL".to_string());
            }
        }
    }
    values.push(quote_literal(&serde_json::to_string(&asset.details())?));
    if layout.has_tags() {
        values.push(tags_literal(asset.tags(), dialect)?);
    }
    Ok(format!("INSERT INTO assets ({}) VALUES ({});", columns(layout), values.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_graph::{Domain, Subdomain};
    use fixturegen_core::{default_organizations, AssetId, AssetKind, ParentRef};

    fn domain() -> Domain {
        Domain {
            id: AssetId::from([1; 16]),
            org_id: default_organizations()[1].id,
            name: "o'reilly.com".into(),
            registrar: "Hover".into(),
            registrant_organization: "Beta LLC".into(),
            expiry: 1_700_000_000,
            tags: vec!["pci".into(), "production".into()],
        }
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn flat_insert_has_four_columns() {
        let sql = render_insert(&Asset::Domain(domain()), Layout::Flat, Dialect::Postgres).unwrap();
        assert!(sql.starts_with("INSERT INTO assets (id, org_id, type, details) VALUES ("));
        assert!(sql.contains("'22222222-2222-2222-2222-222222222222', 'domain', '{"));
        assert!(sql.contains("o''reilly.com"));
        assert!(sql.ends_with(");"));
    }

    #[test]
    fn root_rows_get_null_parents() {
        let sql = render_insert(&Asset::Domain(domain()), Layout::Graph, Dialect::Postgres).unwrap();
        assert!(sql.contains("'domain', NULL, NULL, '{"));
    }

    #[test]
    fn tags_render_per_dialect() {
        let d = Asset::Domain(domain());
        let pg = render_insert(&d, Layout::Tagged, Dialect::Postgres).unwrap();
        assert!(pg.ends_with("ARRAY['pci','production']::text[]);"));
        let lite = render_insert(&d, Layout::Tagged, Dialect::Sqlite).unwrap();
        assert!(lite.ends_with(r#"'["pci","production"]');"#));
    }

    #[test]
    fn child_rows_reference_parent() {
        let parent = ParentRef { id: AssetId::from([1; 16]), kind: AssetKind::Domain };
        let s = Asset::Subdomain(Subdomain {
            id: AssetId::from([2; 16]),
            org_id: default_organizations()[1].id,
            parent,
            name: "www.a.com".into(),
            tags: vec![],
        });
        let sql = render_insert(&s, Layout::Tagged, Dialect::Postgres).unwrap();
        assert!(sql.contains(&format!("'subdomain', '{}', 'domain'", parent.id)));
        assert!(sql.ends_with("'{}'::text[]);"));
    }
}
