use quarry::{
    Connection, ConnectionString, Driver, Error, Executor, GenericSqlWriter, QueryResult, Result,
    RowLabeled, RowNames, RowsAffected, Statement, Value,
    stream::{self, Stream},
};
use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::{Arc, LazyLock, Mutex, PoisonError},
};

static SERVERS: LazyLock<Mutex<HashMap<String, Arc<MockServer>>>> =
    LazyLock::new(Default::default);

#[derive(Default)]
struct MockState {
    responses: VecDeque<std::result::Result<Vec<QueryResult>, String>>,
    statements: Vec<Statement>,
    connects: usize,
    disconnects: usize,
    fail_connect: bool,
}

/// Scripted in-memory database reached through `mock://<name>/db` connection strings.
///
/// Each statement run consumes the next scripted response, statements without a response
/// produce no result.
pub struct MockServer {
    name: String,
    state: Mutex<MockState>,
}

impl MockServer {
    /// Registers a fresh server under `name`, replacing any previous one.
    pub fn start(name: &str) -> Arc<MockServer> {
        let server = Arc::new(MockServer {
            name: name.to_owned(),
            state: Default::default(),
        });
        SERVERS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), server.clone());
        server
    }

    pub fn find(name: &str) -> Option<Arc<MockServer>> {
        SERVERS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn url(&self) -> String {
        format!("mock://{}/db", self.name)
    }

    pub fn respond(&self, results: Vec<QueryResult>) -> &Self {
        self.state().responses.push_back(Ok(results));
        self
    }

    /// Next statement produces `rows`, labeled with `columns`.
    pub fn respond_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) -> &Self {
        let labels: RowNames = columns.iter().map(|c| c.to_string()).collect();
        self.respond(
            rows.into_iter()
                .map(|values| RowLabeled::new(labels.clone(), values.into()).into())
                .collect(),
        )
    }

    pub fn respond_affected(&self, rows_affected: u64) -> &Self {
        self.respond(vec![
            RowsAffected {
                rows_affected,
                last_affected_id: None,
            }
            .into(),
        ])
    }

    /// Next statement fails with `message`.
    pub fn fail_next(&self, message: &str) -> &Self {
        self.state().responses.push_back(Err(message.to_owned()));
        self
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state().fail_connect = fail;
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.state().statements.clone()
    }

    /// SQL text of the statements run so far.
    pub fn sql(&self) -> Vec<String> {
        self.state()
            .statements
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state().disconnects
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}

pub struct MockConnection {
    driver: MockDriver,
    server: Arc<MockServer>,
}

impl MockConnection {
    pub fn server(&self) -> &Arc<MockServer> {
        &self.server
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        &self.driver
    }

    fn run(&self, statement: Statement) -> impl Stream<Item = Result<QueryResult>> + Send {
        let mut state = self.server.state();
        log::debug!("Mock {} runs: {}", self.server.name, statement);
        state.statements.push(statement);
        let items: Vec<Result<QueryResult>> = match state.responses.pop_front() {
            Some(Ok(results)) => results.into_iter().map(Ok).collect(),
            Some(Err(message)) => vec![Err(Error::msg(message))],
            None => Vec::new(),
        };
        stream::iter(items)
    }
}

impl Connection for MockConnection {
    fn connect(url: &ConnectionString) -> impl Future<Output = Result<Self>> + Send {
        let name = url.host().unwrap_or_default().to_owned();
        async move {
            let Some(server) = MockServer::find(&name) else {
                return Err(Error::msg(format!("No mock server named `{name}`")));
            };
            {
                let mut state = server.state();
                if state.fail_connect {
                    return Err(Error::msg(format!("Mock server `{name}` refused the connection")));
                }
                state.connects += 1;
            }
            Ok(MockConnection {
                driver: MockDriver,
                server,
            })
        }
    }

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        self.server.state().disconnects += 1;
        async { Ok(()) }
    }
}
