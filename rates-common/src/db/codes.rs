//! Location code lookup
//!
//! The `codes` table maps every region slug and every port code to the
//! elementary port codes it denotes, so the aggregate query can treat a port
//! and a region the same way: one join against `codes` on `key`.
//!
//! A region resolves to its own ports plus the ports of every descendant
//! sub-region. A port resolves to itself. The table is derived data and is
//! only ever rebuilt in full.

use crate::db::models::{LocationCode, Port, Region};
use crate::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{info, warn};

/// Region slug → resolved elementary port codes
pub type RegionCodes = BTreeMap<String, BTreeSet<String>>;

/// Rows per INSERT statement; two binds each keeps us under SQLite's limit
const INSERT_CHUNK_ROWS: usize = 400;

/// Resolve every region to the ports it covers, transitively
///
/// Walks the hierarchy breadth-first from top-level regions with an explicit
/// queue. Each visited region carries its ancestor chain, and its directly
/// owned ports are added to its own set and to every ancestor's set.
///
/// A region whose `parent_slug` names no known region is treated as
/// top-level. Regions that can't be reached from any top-level region can
/// only come from a parent cycle; they are still visited, starting from the
/// first unvisited one in input order.
pub fn build_region_codes(regions: &[Region], ports: &[Port]) -> RegionCodes {
    let known: HashSet<&str> = regions.iter().map(|r| r.slug.as_str()).collect();

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for region in regions {
        if let Some(parent) = region.parent_slug.as_deref() {
            if known.contains(parent) {
                children.entry(parent).or_default().push(region.slug.as_str());
            }
        }
    }

    let mut owned_ports: HashMap<&str, Vec<&str>> = HashMap::new();
    for port in ports {
        if let Some(parent) = port.parent_slug.as_deref() {
            owned_ports.entry(parent).or_default().push(port.code.as_str());
        }
    }

    let mut resolved: RegionCodes = regions
        .iter()
        .map(|r| (r.slug.clone(), BTreeSet::new()))
        .collect();

    let roots = regions.iter().filter(|r| match r.parent_slug.as_deref() {
        None => true,
        Some(parent) => !known.contains(parent),
    });

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, Vec<&str>)> =
        roots.map(|r| (r.slug.as_str(), Vec::new())).collect();

    loop {
        while let Some((slug, ancestors)) = queue.pop_front() {
            if !visited.insert(slug) {
                continue;
            }

            if let Some(codes) = owned_ports.get(slug) {
                for target in ancestors.iter().copied().chain(std::iter::once(slug)) {
                    resolved
                        .entry(target.to_string())
                        .or_default()
                        .extend(codes.iter().map(|c| c.to_string()));
                }
            }

            if let Some(subregions) = children.get(slug) {
                for &child in subregions {
                    if !visited.contains(child) {
                        let mut chain = ancestors.clone();
                        chain.push(slug);
                        queue.push_back((child, chain));
                    }
                }
            }
        }

        match regions.iter().find(|r| !visited.contains(r.slug.as_str())) {
            Some(region) => {
                warn!(
                    "Region '{}' is not reachable from a top-level region (parent cycle?)",
                    region.slug
                );
                queue.push_back((region.slug.as_str(), Vec::new()));
            }
            None => break,
        }
    }

    resolved
}

/// Flatten the resolved hierarchy into `codes` rows
///
/// Emits one row per (region, port) pair plus the reflexive (port, port) row
/// for every port. Rows are sorted and unique.
pub fn codes_table_rows(regions: &[Region], ports: &[Port]) -> Vec<LocationCode> {
    let region_codes = build_region_codes(regions, ports);

    let mut rows: BTreeSet<LocationCode> = BTreeSet::new();
    for (key, codes) in region_codes {
        for code in codes {
            rows.insert(LocationCode {
                key: key.clone(),
                code,
            });
        }
    }
    for port in ports {
        rows.insert(LocationCode {
            key: port.code.clone(),
            code: port.code.clone(),
        });
    }

    rows.into_iter().collect()
}

/// Drop, recreate and refill the `codes` table from `regions` and `ports`
///
/// Runs in a single transaction; readers see either the old or the new table.
/// Returns the number of rows inserted.
pub async fn rebuild_codes_table(pool: &SqlitePool) -> Result<usize> {
    let regions = sqlx::query_as::<_, Region>("SELECT slug, parent_slug FROM regions")
        .fetch_all(pool)
        .await?;
    let ports = sqlx::query_as::<_, Port>("SELECT code, parent_slug FROM ports")
        .fetch_all(pool)
        .await?;

    let rows = codes_table_rows(&regions, &ports);

    let mut tx = pool.begin().await?;

    sqlx::query("DROP TABLE IF EXISTS codes")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        CREATE TABLE codes (
            key TEXT NOT NULL,
            code TEXT NOT NULL,
            PRIMARY KEY (key, code)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO codes (key, code) ");
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.key.clone()).push_bind(row.code.clone());
        });
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    info!(
        "Rebuilt codes table: {} rows from {} regions and {} ports",
        rows.len(),
        regions.len(),
        ports.len()
    );

    Ok(rows.len())
}

/// Elementary port codes for `key`; empty when the key is unknown
pub async fn resolve(pool: &SqlitePool, key: &str) -> Result<BTreeSet<String>> {
    let codes: Vec<String> = sqlx::query_scalar("SELECT code FROM codes WHERE key = ?")
        .bind(key)
        .fetch_all(pool)
        .await?;

    Ok(codes.into_iter().collect())
}
