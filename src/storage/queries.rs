//! SQL query operations for the SQLite store

use super::{
    models::*, schema::OlympicsDatabase, Lookup, OlympicsSource, PredictionSource,
};
use crate::error::Result;
use crate::query::aggregate::{
    CountryBucket, MedalBucket, MedalDistribution, SportBucket, YearBucket,
};
use crate::query::assemble::FilterOptions;
use crate::query::compiler::{
    compile, compile_predictions, CompiledFilter, SqlParam, PREDICTIONS_FROM, PREDICTIONS_ORDER,
    RESULTS_FROM, RESULTS_ORDER, RESULT_COLUMNS,
};
use crate::query::{AggregationKey, Aggregations, BaseStats, FilterSet, PredictionQuery, Window};
use crate::types::{AthleteId, Medal, ResultId, Season};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use tracing::debug;

/// Rows written by a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub athletes: usize,
    pub hosts: usize,
    pub results: usize,
    pub predictions: usize,
    pub summaries: usize,
}

impl OlympicsDatabase {
    /// Insert or replace an athlete
    pub fn upsert_athlete(&self, athlete: &Athlete) -> Result<()> {
        let conn = self.connection()?;
        insert_athlete(&conn, athlete)?;
        self.counts.clear();
        Ok(())
    }

    /// Insert or replace a host edition
    pub fn upsert_host(&self, host: &Host) -> Result<()> {
        let conn = self.connection()?;
        insert_host(&conn, host)?;
        self.counts.clear();
        Ok(())
    }

    /// Insert or replace a result row. Host-derived fields are not stored;
    /// they come from the hosts relation at query time.
    pub fn upsert_result(&self, result: &MedalResult) -> Result<()> {
        let conn = self.connection()?;
        insert_result(&conn, result)?;
        self.counts.clear();
        Ok(())
    }

    pub fn insert_prediction(&self, prediction: &PredictionRecord) -> Result<()> {
        let conn = self.connection()?;
        insert_prediction(&conn, prediction)?;
        Ok(())
    }

    pub fn upsert_country_summary(&self, summary: &CountrySummary) -> Result<()> {
        let conn = self.connection()?;
        insert_summary(&conn, summary)?;
        Ok(())
    }

    /// Load a complete snapshot in one transaction.
    ///
    /// The predictions table is created only when the snapshot has predictions.
    pub fn import(
        &self,
        athletes: &[Athlete],
        hosts: &[Host],
        results: &[MedalResult],
        predictions: &[PredictionRecord],
        summaries: &[CountrySummary],
    ) -> Result<ImportSummary> {
        if !predictions.is_empty() {
            self.create_prediction_table()?;
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        for athlete in athletes {
            insert_athlete(&tx, athlete)?;
        }
        for host in hosts {
            insert_host(&tx, host)?;
        }
        for result in results {
            insert_result(&tx, result)?;
        }
        for prediction in predictions {
            insert_prediction(&tx, prediction)?;
        }
        for summary in summaries {
            insert_summary(&tx, summary)?;
        }
        tx.commit()?;
        self.counts.clear();

        Ok(ImportSummary {
            athletes: athletes.len(),
            hosts: hosts.len(),
            results: results.len(),
            predictions: predictions.len(),
            summaries: summaries.len(),
        })
    }

    /// Medal tallies per country, optionally truncated.
    pub fn by_country(&self, filters: &FilterSet, top: Option<usize>) -> Result<Vec<CountryBucket>> {
        let compiled = compile(filters);
        let sql = format!(
            "SELECT COALESCE(a.nationality, h.country) AS bucket_country,
                    COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN m.medal = 'GOLD' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN m.medal = 'SILVER' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN m.medal = 'BRONZE' THEN 1 ELSE 0 END), 0)
             {} WHERE {} AND COALESCE(a.nationality, h.country) IS NOT NULL
             GROUP BY bucket_country
             ORDER BY total DESC, bucket_country ASC
             LIMIT ?",
            RESULTS_FROM, compiled.where_clause
        );
        let conn = self.connection()?;
        query_rows(&conn, &sql, &compiled, &[limit_param(top)], |row| {
            Ok(CountryBucket {
                country: row.get(0)?,
                total: count(row, 1)?,
                gold: count(row, 2)?,
                silver: count(row, 3)?,
                bronze: count(row, 4)?,
            })
        })
    }

    pub fn by_year(&self, filters: &FilterSet) -> Result<Vec<YearBucket>> {
        let compiled = compile(filters);
        let sql = format!(
            "SELECT m.year, COUNT(*) {} WHERE {} GROUP BY m.year ORDER BY m.year ASC",
            RESULTS_FROM, compiled.where_clause
        );
        let conn = self.connection()?;
        query_rows(&conn, &sql, &compiled, &[], |row| {
            Ok(YearBucket {
                year: row.get(0)?,
                medals: count(row, 1)?,
            })
        })
    }

    pub fn by_medal(&self, filters: &FilterSet) -> Result<Vec<MedalBucket>> {
        let compiled = compile(filters);
        let sql = format!(
            "SELECT m.medal, COUNT(*) {} WHERE {} AND m.medal IN ('GOLD', 'SILVER', 'BRONZE')
             GROUP BY m.medal ORDER BY m.medal ASC",
            RESULTS_FROM, compiled.where_clause
        );
        let conn = self.connection()?;
        let rows = query_rows(&conn, &sql, &compiled, &[], |row| {
            Ok((row.get::<_, String>(0)?, count(row, 1)?))
        })?;
        Ok(rows
            .into_iter()
            .filter_map(|(medal, count)| {
                medal
                    .parse::<Medal>()
                    .ok()
                    .map(|medal| MedalBucket { medal, count })
            })
            .collect())
    }

    pub fn by_sport(&self, filters: &FilterSet, top: Option<usize>) -> Result<Vec<SportBucket>> {
        let compiled = compile(filters);
        let sql = format!(
            "SELECT m.sport, COUNT(*) AS participants {} WHERE {} AND m.sport IS NOT NULL
             GROUP BY m.sport
             ORDER BY participants DESC, m.sport ASC
             LIMIT ?",
            RESULTS_FROM, compiled.where_clause
        );
        let conn = self.connection()?;
        query_rows(&conn, &sql, &compiled, &[limit_param(top)], |row| {
            Ok(SportBucket {
                sport: row.get(0)?,
                participants: count(row, 1)?,
            })
        })
    }

    fn distinct_strings(&self, sql: &str) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }

    fn distinct_years(&self, order: &str) -> Result<Vec<i32>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT year FROM medals WHERE year IS NOT NULL ORDER BY year {}",
            order
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, i32>(0))?;

        let mut years = Vec::new();
        for row in rows {
            years.push(row?);
        }
        Ok(years)
    }

    fn select_predictions(
        &self,
        query: &PredictionQuery,
        window: Window,
    ) -> Result<Vec<PredictionRecord>> {
        let compiled = compile_predictions(query);
        let (actual_column, join) = if query.include_actual {
            (
                "cys.medals_total",
                "LEFT JOIN country_year_summary cys
                   ON cys.country_name = mp.country_name AND cys.slug_game = mp.slug_game",
            )
        } else {
            ("NULL", "")
        };
        let sql = format!(
            "SELECT mp.country_name, mp.slug_game, mp.model_name, mp.target,
                    mp.predicted_value, mp.created_at, {}
             {} {} WHERE {} {} LIMIT ? OFFSET ?",
            actual_column, PREDICTIONS_FROM, join, compiled.where_clause, PREDICTIONS_ORDER
        );

        let conn = self.connection()?;
        let include_actual = query.include_actual;
        query_rows(&conn, &sql, &compiled, &window_params(window), |row| {
            Ok(PredictionRecord {
                country: row.get(0)?,
                slug_game: row.get(1)?,
                model_name: row.get(2)?,
                target: row.get(3)?,
                predicted_value: row.get(4)?,
                created_at: row.get(5)?,
                actual_medals: if include_actual {
                    Some(row.get::<_, Option<f64>>(6)?)
                } else {
                    None
                },
            })
        })
    }
}

impl OlympicsSource for OlympicsDatabase {
    fn count_results(&self, filters: &FilterSet) -> Result<u64> {
        if let Some(total) = self.counts.get(filters) {
            return Ok(total);
        }

        let compiled = compile(filters);
        let sql = format!(
            "SELECT COUNT(*) {} WHERE {}",
            RESULTS_FROM, compiled.where_clause
        );
        debug!(sql = %sql, params = ?compiled.params, "Counting results");

        let conn = self.connection()?;
        let total: i64 = conn.query_row(&sql, params_from_iter(compiled.params_with(&[])), |row| {
            row.get(0)
        })?;
        let total = total.max(0) as u64;

        self.counts.put(filters.clone(), total);
        Ok(total)
    }

    fn fetch_results(&self, filters: &FilterSet, window: Window) -> Result<Vec<MedalResult>> {
        let compiled = compile(filters);
        let sql = format!(
            "SELECT {} {} WHERE {} {} LIMIT ? OFFSET ?",
            RESULT_COLUMNS, RESULTS_FROM, compiled.where_clause, RESULTS_ORDER
        );
        let conn = self.connection()?;
        query_rows(&conn, &sql, &compiled, &window_params(window), row_to_result)
    }

    fn base_stats(&self, filters: &FilterSet) -> Result<BaseStats> {
        let compiled = compile(filters);
        let sql = format!(
            "SELECT COUNT(DISTINCT m.athlete_id),
                    COUNT(*),
                    COUNT(DISTINCT COALESCE(a.nationality, h.country)),
                    COUNT(DISTINCT m.sport),
                    COALESCE(SUM(CASE WHEN m.medal = 'GOLD' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN m.medal = 'SILVER' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN m.medal = 'BRONZE' THEN 1 ELSE 0 END), 0)
             {} WHERE {}",
            RESULTS_FROM, compiled.where_clause
        );
        debug!(sql = %sql, params = ?compiled.params, "Computing base stats");

        let conn = self.connection()?;
        let stats = conn.query_row(&sql, params_from_iter(compiled.params_with(&[])), |row| {
            Ok(BaseStats {
                total_athletes: count(row, 0)?,
                total_medals: count(row, 1)?,
                total_countries: count(row, 2)?,
                total_sports: count(row, 3)?,
                medal_distribution: MedalDistribution {
                    gold: count(row, 4)?,
                    silver: count(row, 5)?,
                    bronze: count(row, 6)?,
                },
            })
        })?;
        Ok(stats)
    }

    fn aggregate(
        &self,
        filters: &FilterSet,
        keys: &BTreeSet<AggregationKey>,
    ) -> Result<Aggregations> {
        use crate::query::aggregate::{TOP_COUNTRIES, TOP_SPORTS};

        let mut aggregations = Aggregations::default();
        for key in keys {
            match key {
                AggregationKey::ByCountry => {
                    aggregations.by_country = Some(self.by_country(filters, Some(TOP_COUNTRIES))?)
                }
                AggregationKey::ByYear => aggregations.by_year = Some(self.by_year(filters)?),
                AggregationKey::ByMedal => aggregations.by_medal = Some(self.by_medal(filters)?),
                AggregationKey::BySport => {
                    aggregations.by_sport = Some(self.by_sport(filters, Some(TOP_SPORTS))?)
                }
            }
        }
        Ok(aggregations)
    }

    fn athletes(&self, window: Window) -> Result<Vec<Athlete>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, sex, age, nationality
             FROM athletes
             ORDER BY name ASC, id ASC
             LIMIT ? OFFSET ?",
        )?;
        let rows = stmt.query_map(params_from_iter(window_params(window)), |row| {
            Ok(Athlete {
                id: AthleteId::new(row.get::<_, i64>(0)? as u64),
                name: row.get(1)?,
                gender: parsed(row, 2)?,
                age: age(row, 3)?,
                nationality: row.get(4)?,
            })
        })?;

        let mut athletes = Vec::new();
        for row in rows {
            athletes.push(row?);
        }
        Ok(athletes)
    }

    fn hosts(&self) -> Result<Vec<Host>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT year, season, city, country
             FROM hosts
             ORDER BY year DESC, season ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Host {
                year: row.get(0)?,
                season: parsed(row, 1)?,
                city: row.get(2)?,
                country: row.get(3)?,
            })
        })?;

        let mut hosts = Vec::new();
        for row in rows {
            hosts.push(row?);
        }
        Ok(hosts)
    }

    fn medal_summary(&self) -> Result<Vec<MedalSummaryRow>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT m.year, COALESCE(m.city, h.city) AS edition_city, m.medal, COUNT(*)
             FROM medals m
             LEFT JOIN hosts h ON h.year = m.year AND h.season = m.season
             WHERE m.medal IN ('GOLD', 'SILVER', 'BRONZE')
             GROUP BY m.year, edition_city, m.medal
             ORDER BY m.year DESC, edition_city ASC,
                      CASE m.medal WHEN 'GOLD' THEN 0 WHEN 'SILVER' THEN 1 ELSE 2 END",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i32>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                count(row, 3)?,
            ))
        })?;

        let mut summary = Vec::new();
        for row in rows {
            let (year, city, medal, count) = row?;
            if let Ok(medal) = medal.parse::<Medal>() {
                summary.push(MedalSummaryRow {
                    year,
                    city,
                    medal,
                    count,
                });
            }
        }
        Ok(summary)
    }

    fn sports(&self) -> Result<Vec<String>> {
        self.distinct_strings(
            "SELECT DISTINCT sport FROM medals WHERE sport IS NOT NULL ORDER BY sport",
        )
    }

    fn years(&self) -> Result<Vec<i32>> {
        self.distinct_years("DESC")
    }

    fn countries(&self) -> Result<Vec<String>> {
        self.distinct_strings(
            "SELECT DISTINCT nationality FROM athletes WHERE nationality IS NOT NULL
             ORDER BY nationality",
        )
    }

    fn top_sports(&self, limit: usize) -> Result<Vec<SportBucket>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT sport, COUNT(*) AS participants
             FROM medals
             WHERE sport IS NOT NULL
             GROUP BY sport
             ORDER BY participants DESC, sport ASC
             LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SportBucket {
                sport: row.get(0)?,
                participants: count(row, 1)?,
            })
        })?;

        let mut sports = Vec::new();
        for row in rows {
            sports.push(row?);
        }
        Ok(sports)
    }

    fn filter_options(&self) -> Result<FilterOptions> {
        let seasons = self
            .distinct_strings(
                "SELECT DISTINCT season FROM hosts WHERE season IS NOT NULL ORDER BY season",
            )?
            .iter()
            .filter_map(|season| season.parse::<Season>().ok())
            .collect();

        Ok(FilterOptions::new(
            self.distinct_years("ASC")?,
            seasons,
            self.countries()?,
            self.sports()?,
        ))
    }
}

impl PredictionSource for OlympicsDatabase {
    fn count_predictions(&self, query: &PredictionQuery) -> Result<Lookup<u64>> {
        let compiled = compile_predictions(query);
        let sql = format!(
            "SELECT COUNT(*) {} WHERE {}",
            PREDICTIONS_FROM, compiled.where_clause
        );
        debug!(sql = %sql, params = ?compiled.params, "Counting predictions");

        let counted = self.connection().and_then(|conn| {
            conn.query_row(&sql, params_from_iter(compiled.params_with(&[])), |row| {
                row.get::<_, i64>(0)
            })
            .map_err(Into::into)
        });
        Ok(Lookup::from_result(counted)?.map(|total| total.max(0) as u64))
    }

    fn fetch_predictions(
        &self,
        query: &PredictionQuery,
        window: Window,
    ) -> Result<Lookup<Vec<PredictionRecord>>> {
        Lookup::from_result(self.select_predictions(query, window))
    }
}

fn insert_athlete(conn: &Connection, athlete: &Athlete) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO athletes (id, name, sex, age, nationality)
         VALUES (?, ?, ?, ?, ?)",
        params![
            athlete.id.as_u64() as i64,
            athlete.name,
            athlete.gender,
            athlete.age,
            athlete.nationality
        ],
    )?;
    Ok(())
}

fn insert_host(conn: &Connection, host: &Host) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO hosts (year, season, city, country) VALUES (?, ?, ?, ?)",
        params![host.year, host.season, host.city, host.country],
    )?;
    Ok(())
}

fn insert_result(conn: &Connection, result: &MedalResult) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO medals (id, athlete_id, year, season, city, sport, event, medal)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            result.id.as_u64() as i64,
            result.athlete_id.as_u64() as i64,
            result.year,
            result.season,
            result.city,
            result.sport,
            result.event,
            result.medal
        ],
    )?;
    Ok(())
}

fn insert_prediction(conn: &Connection, prediction: &PredictionRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO medal_predictions
         (country_name, slug_game, model_name, target, predicted_value, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            prediction.country,
            prediction.slug_game,
            prediction.model_name,
            prediction.target,
            prediction.predicted_value,
            prediction.created_at
        ],
    )?;
    Ok(())
}

fn insert_summary(conn: &Connection, summary: &CountrySummary) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO country_year_summary (country_name, slug_game, medals_total)
         VALUES (?, ?, ?)",
        params![summary.country_name, summary.slug_game, summary.medals_total],
    )?;
    Ok(())
}

/// Run a compiled query with trailing parameters and collect mapped rows.
fn query_rows<T, F>(
    conn: &Connection,
    sql: &str,
    compiled: &CompiledFilter,
    extra: &[SqlParam],
    map: F,
) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    debug!(sql = %sql, params = ?compiled.params, extra = ?extra, "Executing query");

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(compiled.params_with(extra)), map)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn row_to_result(row: &Row<'_>) -> rusqlite::Result<MedalResult> {
    Ok(MedalResult {
        id: ResultId::new(row.get::<_, i64>(0)? as u64),
        athlete_id: AthleteId::new(row.get::<_, i64>(1)? as u64),
        name: row.get(2)?,
        gender: parsed(row, 3)?,
        age: age(row, 4)?,
        nationality: row.get(5)?,
        country: row.get(6)?,
        year: row.get(7)?,
        season: parsed(row, 8)?,
        city: row.get(9)?,
        sport: row.get(10)?,
        event: row.get(11)?,
        medal: parsed(row, 12)?,
    })
}

/// Optional enum column; unrecognised text reads as absent.
fn parsed<T: std::str::FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|value| value.parse().ok()))
}

fn age(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u32>> {
    Ok(row
        .get::<_, Option<i64>>(idx)?
        .and_then(|value| u32::try_from(value).ok()))
}

fn count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    Ok(row.get::<_, i64>(idx)?.max(0) as u64)
}

/// SQLite treats a negative LIMIT as "no limit".
fn limit_param(top: Option<usize>) -> SqlParam {
    SqlParam::Int(top.map_or(-1, |top| top as i64))
}

fn window_params(window: Window) -> [SqlParam; 2] {
    [
        SqlParam::Int(window.limit.min(i64::MAX as u64) as i64),
        SqlParam::Int(window.offset.min(i64::MAX as u64) as i64),
    ]
}
