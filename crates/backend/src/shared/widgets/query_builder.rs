use contracts::shared::widgets::{CustomWidgetDataConfig, DataFilter, FilterOperator};
use serde_json::Value;

use super::error::QueryBuildError;
use super::source_registry::{ColumnType, DataSource, SourceRegistry};

/// Result of query building
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    /// SQL query string
    pub sql: String,
    /// Bound parameters
    pub params: Vec<QueryParam>,
    /// Result column names in projection order
    pub columns: Vec<String>,
}

/// Query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Integer(i64),
    Numeric(f64),
}

impl From<&QueryParam> for sea_orm::Value {
    fn from(param: &QueryParam) -> Self {
        match param {
            QueryParam::Text(s) => s.clone().into(),
            QueryParam::Integer(i) => (*i).into(),
            QueryParam::Numeric(n) => (*n).into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    fn default_alias(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ProjectionExpr {
    All,
    Column(String),
    /// `column == None` only for `count(*)`
    Aggregate {
        function: AggregateFunction,
        column: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct ProjectionItem {
    expr: ProjectionExpr,
    alias: Option<String>,
}

impl ProjectionItem {
    /// Name of the result column
    fn output_name(&self) -> Option<&str> {
        match (&self.alias, &self.expr) {
            (Some(alias), _) => Some(alias.as_str()),
            (None, ProjectionExpr::Column(column)) => Some(column.as_str()),
            (None, ProjectionExpr::Aggregate { function, .. }) => Some(function.default_alias()),
            (None, ProjectionExpr::All) => None,
        }
    }
}

/// `[a-z_][a-z0-9_]*`, case-insensitive
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Output names are quoted so reserved words stay usable as aliases
fn quoted(name: &str) -> String {
    format!("\"{}\"", name)
}

fn identifier(value: &str) -> Result<String, QueryBuildError> {
    let value = value.trim();
    if is_identifier(value) {
        Ok(value.to_string())
    } else {
        Err(QueryBuildError::InvalidIdentifier(value.to_string()))
    }
}

/// Split `expr as alias` or `alias:expr`
fn split_alias(item: &str) -> (Option<&str>, &str) {
    let lower = item.to_ascii_lowercase();
    if let Some(pos) = lower.rfind(" as ") {
        return (Some(item[pos + 4..].trim()), item[..pos].trim());
    }
    match item.split_once(':') {
        Some((alias, expr)) => (Some(alias.trim()), expr.trim()),
        None => (None, item.trim()),
    }
}

fn parse_projection_item(item: &str) -> Result<ProjectionItem, QueryBuildError> {
    let (alias, expr) = split_alias(item);
    let alias = alias.map(identifier).transpose()?;

    let expr = if expr == "*" {
        if alias.is_some() {
            return Err(QueryBuildError::InvalidProjection(
                "'*' cannot be aliased".to_string(),
            ));
        }
        ProjectionExpr::All
    } else if let (Some(open), true) = (expr.find('('), expr.ends_with(')')) {
        let name = expr[..open].trim();
        let argument = expr[open + 1..expr.len() - 1].trim();
        let function = AggregateFunction::parse(name).ok_or_else(|| {
            QueryBuildError::InvalidProjection(format!("unknown function '{}'", name))
        })?;
        let column = match (function, argument) {
            (AggregateFunction::Count, "*") | (AggregateFunction::Count, "") => None,
            (_, "*") | (_, "") => {
                return Err(QueryBuildError::InvalidProjection(format!(
                    "{}() needs a column",
                    function.default_alias()
                )))
            }
            (_, column) => Some(identifier(column)?),
        };
        ProjectionExpr::Aggregate { function, column }
    } else {
        ProjectionExpr::Column(identifier(expr)?)
    };

    Ok(ProjectionItem { expr, alias })
}

fn parse_projection(select: &str) -> Result<Vec<ProjectionItem>, QueryBuildError> {
    let items = select
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_projection_item)
        .collect::<Result<Vec<_>, _>>()?;

    if items.is_empty() {
        return Ok(vec![ProjectionItem {
            expr: ProjectionExpr::All,
            alias: None,
        }]);
    }

    let has_aggregate = items
        .iter()
        .any(|i| matches!(i.expr, ProjectionExpr::Aggregate { .. }));
    let has_all = items.iter().any(|i| i.expr == ProjectionExpr::All);
    if has_aggregate && has_all {
        return Err(QueryBuildError::InvalidProjection(
            "'*' cannot be combined with aggregates".to_string(),
        ));
    }

    Ok(items)
}

/// Translates a custom widget descriptor into a parameterized, tenant-scoped
/// SQL query over an allow-listed source
pub struct QueryBuilder<'a> {
    source: &'a DataSource,
    config: &'a CustomWidgetDataConfig,
    tenant_id: &'a str,
    max_limit: u64,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(
        source: &'a DataSource,
        config: &'a CustomWidgetDataConfig,
        tenant_id: &'a str,
        max_limit: u64,
    ) -> Self {
        Self {
            source,
            config,
            tenant_id,
            max_limit,
        }
    }

    /// Effective row limit: the descriptor's limit clamped to the configured maximum
    pub fn effective_limit(&self) -> u64 {
        match self.config.limit {
            Some(limit) => limit.min(self.max_limit),
            None => self.max_limit,
        }
    }

    /// Build the SQL query
    pub fn build(&self) -> Result<BuiltQuery, QueryBuildError> {
        let projection = parse_projection(self.config.select.as_deref().unwrap_or("*"))?;

        let (select_clause, columns) = self.build_select_clause(&projection)?;
        let (where_clause, params) = self.build_where_clause()?;
        let group_by_clause = self.build_group_by_clause(&projection);
        let order_by_clause = self.build_order_by_clause(&projection)?;

        let mut sql = format!(
            "SELECT {} FROM {}",
            select_clause, self.source.table_name
        );

        if !where_clause.is_empty() {
            sql.push_str(&format!(" WHERE {}", where_clause));
        }

        if !group_by_clause.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", group_by_clause));
        }

        if !order_by_clause.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", order_by_clause));
        }

        sql.push_str(&format!(" LIMIT {}", self.effective_limit()));

        Ok(BuiltQuery {
            sql,
            params,
            columns,
        })
    }

    fn find_column(&self, name: &str) -> Result<&'a str, QueryBuildError> {
        let source: &'a DataSource = self.source;
        source
            .column(name)
            .map(|c| c.name)
            .ok_or_else(|| QueryBuildError::ColumnNotAllowed {
                data_source: source.id.to_string(),
                column: name.to_string(),
            })
    }

    fn column_type(&self, name: &str) -> ColumnType {
        self.source
            .column(name)
            .map(|c| c.column_type)
            .unwrap_or(ColumnType::Text)
    }

    fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.source.table_name, column)
    }

    /// SELECT list and the result column names it produces
    fn build_select_clause(
        &self,
        projection: &[ProjectionItem],
    ) -> Result<(String, Vec<String>), QueryBuildError> {
        let mut expressions: Vec<(String, &str)> = Vec::with_capacity(projection.len());

        for item in projection {
            match &item.expr {
                ProjectionExpr::All => {
                    // Only allow-listed columns, never the raw table
                    for column in self.source.columns {
                        expressions.push((self.qualified(column.name), column.name));
                    }
                }
                ProjectionExpr::Column(name) => {
                    let column = self.find_column(name)?;
                    let alias = item.alias.as_deref().unwrap_or(column);
                    expressions.push((self.qualified(column), alias));
                }
                ProjectionExpr::Aggregate { function, column } => {
                    let argument = match column {
                        Some(name) => self.qualified(self.find_column(name)?),
                        None => "*".to_string(),
                    };
                    let alias = item.alias.as_deref().unwrap_or(function.default_alias());
                    expressions.push((format!("{}({})", function.sql(), argument), alias));
                }
            }
        }

        let mut names: Vec<String> = Vec::with_capacity(expressions.len());
        for (_, name) in &expressions {
            if names.iter().any(|n| n == name) {
                return Err(QueryBuildError::InvalidProjection(format!(
                    "duplicate result column '{}'",
                    name
                )));
            }
            names.push(name.to_string());
        }

        let clause = expressions
            .iter()
            .map(|(expr, name)| format!("{} AS {}", expr, quoted(name)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok((clause, names))
    }

    fn build_where_clause(&self) -> Result<(String, Vec<QueryParam>), QueryBuildError> {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        // Forced tenant scope, independent of the descriptor's own filters
        if let Some(tenant_column) = self.source.tenant_column {
            conditions.push(format!("{} = ?", self.qualified(tenant_column)));
            params.push(QueryParam::Text(self.tenant_id.to_string()));
        }

        for filter in &self.config.filters {
            let condition = self.build_filter_condition(filter, &mut params)?;
            conditions.push(condition);
        }

        Ok((conditions.join(" AND "), params))
    }

    fn build_filter_condition(
        &self,
        filter: &DataFilter,
        params: &mut Vec<QueryParam>,
    ) -> Result<String, QueryBuildError> {
        let column_name = identifier(&filter.column)?;
        let column = self.find_column(&column_name)?;
        let qualified = self.qualified(column);
        let value = filter.resolved_value(self.tenant_id);

        let comparison = |op: &str, params: &mut Vec<QueryParam>| {
            self.push_typed_param(column, &value, params)?;
            Ok::<_, QueryBuildError>(format!("{} {} ?", qualified, op))
        };

        match filter.operator {
            FilterOperator::Eq => comparison("=", params),
            FilterOperator::Neq => comparison("<>", params),
            FilterOperator::Gt => comparison(">", params),
            FilterOperator::Gte => comparison(">=", params),
            FilterOperator::Lt => comparison("<", params),
            FilterOperator::Lte => comparison("<=", params),
            FilterOperator::Like => {
                params.push(QueryParam::Text(like_pattern(column, &value)?));
                Ok(format!("{} LIKE ?", qualified))
            }
            FilterOperator::Ilike => {
                params.push(QueryParam::Text(like_pattern(column, &value)?));
                Ok(format!("LOWER({}) LIKE LOWER(?)", qualified))
            }
            FilterOperator::In => {
                let values = list_values(column, &value)?;
                let placeholders = vec!["?"; values.len()].join(", ");
                for item in &values {
                    self.push_typed_param(column, item, params)?;
                }
                Ok(format!("{} IN ({})", qualified, placeholders))
            }
            FilterOperator::Is => match &value {
                Value::Null => Ok(format!("{} IS NULL", qualified)),
                Value::String(s) if s.eq_ignore_ascii_case("null") => {
                    Ok(format!("{} IS NULL", qualified))
                }
                Value::String(s) if s.eq_ignore_ascii_case("not.null") => {
                    Ok(format!("{} IS NOT NULL", qualified))
                }
                Value::Bool(b) => {
                    params.push(QueryParam::Integer(i64::from(*b)));
                    Ok(format!("{} = ?", qualified))
                }
                _ => Err(invalid_value(column, "'is' expects null or a boolean")),
            },
            FilterOperator::Unsupported => {
                Err(QueryBuildError::UnsupportedOperator(column.to_string()))
            }
        }
    }

    /// Push a parameter coerced to the column's type
    fn push_typed_param(
        &self,
        column: &str,
        value: &Value,
        params: &mut Vec<QueryParam>,
    ) -> Result<(), QueryBuildError> {
        let param = match (self.column_type(column), value) {
            (_, Value::Null) => {
                return Err(invalid_value(column, "null needs the 'is' operator"))
            }
            (_, Value::Array(_)) | (_, Value::Object(_)) => {
                return Err(invalid_value(column, "expected a scalar value"))
            }
            (ColumnType::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => QueryParam::Integer(i),
                None => QueryParam::Numeric(n.as_f64().unwrap_or_default()),
            },
            (ColumnType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(QueryParam::Integer)
                .map_err(|_| invalid_value(column, "expected an integer"))?,
            (ColumnType::Numeric, Value::Number(n)) => {
                QueryParam::Numeric(n.as_f64().unwrap_or_default())
            }
            (ColumnType::Numeric, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(QueryParam::Numeric)
                .map_err(|_| invalid_value(column, "expected a number"))?,
            (_, Value::Bool(b)) => QueryParam::Integer(i64::from(*b)),
            (_, Value::String(s)) => QueryParam::Text(s.clone()),
            (_, Value::Number(n)) => QueryParam::Text(n.to_string()),
        };
        params.push(param);
        Ok(())
    }

    fn build_group_by_clause(&self, projection: &[ProjectionItem]) -> String {
        let has_aggregate = projection
            .iter()
            .any(|i| matches!(i.expr, ProjectionExpr::Aggregate { .. }));
        if !has_aggregate {
            return String::new();
        }

        projection
            .iter()
            .filter_map(|i| match &i.expr {
                ProjectionExpr::Column(name) => Some(self.qualified(name)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn build_order_by_clause(&self, projection: &[ProjectionItem]) -> Result<String, QueryBuildError> {
        let Some(order_by) = self.config.order_by.as_deref() else {
            return Ok(String::new());
        };
        let order_by = identifier(order_by)?;
        let direction = if self.config.ascending.unwrap_or(true) {
            "ASC"
        } else {
            "DESC"
        };

        // Result aliases win over source columns of the same name
        if projection
            .iter()
            .any(|i| i.alias.as_deref() == Some(order_by.as_str()))
        {
            return Ok(format!("{} {}", quoted(&order_by), direction));
        }

        let column = match self.find_column(&order_by) {
            Ok(column) => column,
            Err(err) => {
                let is_output = projection
                    .iter()
                    .any(|i| i.output_name() == Some(order_by.as_str()));
                if is_output {
                    return Ok(format!("{} {}", quoted(&order_by), direction));
                }
                return Err(err);
            }
        };
        Ok(format!("{} {}", self.qualified(column), direction))
    }
}

fn invalid_value(column: &str, reason: &str) -> QueryBuildError {
    QueryBuildError::InvalidFilterValue {
        column: column.to_string(),
        reason: reason.to_string(),
    }
}

/// `*` is accepted as a wildcard alongside `%`
fn like_pattern(column: &str, value: &Value) -> Result<String, QueryBuildError> {
    match value {
        Value::String(s) => Ok(s.replace('*', "%")),
        _ => Err(invalid_value(column, "pattern must be a string")),
    }
}

/// Accepts a JSON array, `(a,b,c)` or `a,b,c`
fn list_values(column: &str, value: &Value) -> Result<Vec<Value>, QueryBuildError> {
    let values = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .map(|v| v.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
            .map(|v| Value::String(v.to_string()))
            .collect(),
        _ => return Err(invalid_value(column, "'in' expects a list")),
    };

    if values.is_empty() {
        return Err(invalid_value(column, "'in' list is empty"));
    }
    Ok(values)
}

/// Look up the descriptor's source and build its query
pub fn build_query(
    registry: &SourceRegistry,
    config: &CustomWidgetDataConfig,
    tenant_id: &str,
    max_limit: u64,
) -> Result<BuiltQuery, QueryBuildError> {
    let table = config.table.trim();
    if !is_identifier(table) {
        return Err(QueryBuildError::InvalidIdentifier(table.to_string()));
    }
    let source = registry
        .get(table)
        .ok_or_else(|| QueryBuildError::UnknownSource(table.to_string()))?;
    QueryBuilder::new(source, config, tenant_id, max_limit).build()
}
