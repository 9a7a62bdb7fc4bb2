//! Tests communication with a python3 XML-RPC server.

use xmlrpc_codec::http::Client;
use xmlrpc_codec::{Fault, Request, Value};

use std::process::{Child, Command};
use std::thread::sleep;
use std::time::{Duration, Instant};
use std::net::TcpStream;

const PORT: u16 = 8000;
const URL: &str = "http://127.0.0.1:8000";

/// The python server process, killed when dropped.
struct Server(Child);

impl Server {
    /// Starts `python3 -m xmlrpc.server`. Returns `None` if python3 isn't available.
    fn start() -> Option<Server> {
        let child = match Command::new("python3").args(["-m", "xmlrpc.server"]).spawn() {
            Ok(child) => child,
            Err(e) => {
                eprintln!("could not start python XML-RPC server, ignoring python test ({})", e);
                return None;
            }
        };
        let mut server = Server(child);

        // wait until someone listens on the port
        let start = Instant::now();
        while TcpStream::connect(("127.0.0.1", PORT)).is_err() {
            server.assert_running();
            sleep(Duration::from_millis(50));
        }
        println!("connected to server after {:?}", start.elapsed());

        Some(server)
    }

    fn assert_running(&mut self) {
        if let Some(status) = self.0.try_wait().unwrap() {
            panic!("python process unexpectedly exited: {}", status);
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        // an error seems to mean that the process has already died, which we don't expect here
        self.0.kill().expect("process already died");
    }
}

fn run_tests() {
    let pow = Request::new("pow").arg(2).arg(8).call_url(URL).unwrap();
    assert_eq!(pow.first().and_then(Value::as_i64), Some(2i64.pow(8)));

    // call with wrong operands should return a fault
    let err = Request::new("pow").arg(2).arg(2).arg("BLA").call_url(URL).unwrap_err();
    err.fault().expect("returned error was not a fault");

    // the same through a configured client
    let client = Client::new(URL, false).unwrap();
    let sum = client.call("add", &[Value::from(2), Value::from(4)]).unwrap();
    assert_eq!(sum, vec![Value::Int(6)]);

    // a multicall reports failed calls as fault structs inside the result array
    let mut call = std::collections::BTreeMap::new();
    call.insert("methodName".to_string(), Value::from("doesn't exist"));
    call.insert("params".to_string(), Value::Array(Vec::new()));
    let results = client.call("system.multicall", &[Value::Array(vec![Value::Struct(call)])]).unwrap();
    let results = results[0].as_array().unwrap();
    Fault::from_value(&results[0]).expect("expected fault as result");
}

fn main() {
    let mut server = match Server::start() {
        Some(server) => server,
        None => return,
    };

    run_tests();
    server.assert_running();
}
