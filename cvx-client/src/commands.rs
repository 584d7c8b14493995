//! Typed wrappers over the controller's documented command set
//!
//! Each wrapper builds the mnemonic and argument string, runs it through
//! [`CvxClient::execute`], and shapes the reply. Write-style commands
//! return the bare [`ErrorCode`]; read-style commands additionally parse
//! the reply fields and yield `None` when the command failed. A success
//! reply whose expected fields are missing or unparsable is reclassified
//! as [`ErrorCode::Unknown`] in the ledger.

use crate::client::CvxClient;
use cvx_core::{ErrorCode, Response};

/// Controller operating mode as reported by `RM`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Setup mode, inspection stopped
    Setup = 0,
    /// Run mode, inspection active
    Run = 1,
}

impl RunMode {
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(RunMode::Setup),
            1 => Some(RunMode::Run),
            _ => None,
        }
    }
}

/// Calendar time as the controller clock represents it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DeviceTime {
    fn to_args(self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// Parse the six clock fields of a `TR` reply.
    fn from_reply(reply: &Response) -> Option<Self> {
        Some(DeviceTime {
            year: reply.parse_field(1)?,
            month: reply.parse_field(2)?,
            day: reply.parse_field(3)?,
            hour: reply.parse_field(4)?,
            minute: reply.parse_field(5)?,
            second: reply.parse_field(6)?,
        })
    }
}

impl CvxClient {
    /// `T1`: fire trigger 1
    pub async fn trigger1(&self) -> ErrorCode {
        self.execute_simple("T1", None).await
    }

    /// `T2`: fire trigger 2
    pub async fn trigger2(&self) -> ErrorCode {
        self.execute_simple("T2", None).await
    }

    /// `T3`: fire trigger 3
    pub async fn trigger3(&self) -> ErrorCode {
        self.execute_simple("T3", None).await
    }

    /// `T4`: fire trigger 4
    pub async fn trigger4(&self) -> ErrorCode {
        self.execute_simple("T4", None).await
    }

    /// `TA`: fire all triggers
    pub async fn trigger_all(&self) -> ErrorCode {
        self.execute_simple("TA", None).await
    }

    /// `RE`: cancel a trigger already accepted for a multi-capture
    /// inspection and discard the partial results
    pub async fn trigger_reset(&self) -> ErrorCode {
        self.execute_simple("RE", None).await
    }

    /// `TE`: permit or prohibit trigger input. The wire argument is
    /// 0 to permit, 1 to prohibit.
    pub async fn trigger_enable(&self, enabled: bool) -> ErrorCode {
        let arg = if enabled { "0" } else { "1" };
        self.execute("TE", Some(arg)).await.error_code
    }

    /// `OE`: permit or prohibit result output. Same wire polarity as
    /// [`trigger_enable`](Self::trigger_enable).
    pub async fn output_enable(&self, enabled: bool) -> ErrorCode {
        let arg = if enabled { "0" } else { "1" };
        self.execute("OE", Some(arg)).await.error_code
    }

    /// `R0`: switch to run mode
    pub async fn to_run_mode(&self) -> ErrorCode {
        self.execute_simple("R0", None).await
    }

    /// `S0`: switch to setup mode
    pub async fn to_setup_mode(&self) -> ErrorCode {
        self.execute_simple("S0", None).await
    }

    /// `RM`: read the current operating mode
    pub async fn run_mode(&self) -> (ErrorCode, Option<RunMode>) {
        let reply = self.execute("RM", None).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match reply.parse_field::<i32>(1).and_then(RunMode::from_wire) {
            Some(mode) => (reply.error_code, Some(mode)),
            None => (self.reclassify("RM", ErrorCode::Unknown), None),
        }
    }

    /// `RS`: software reset
    pub async fn system_reset(&self) -> ErrorCode {
        self.execute_simple("RS", None).await
    }

    /// `RB`: reboot the controller
    pub async fn reboot(&self) -> ErrorCode {
        self.execute_simple("RB", None).await
    }

    /// `SS`: save the current settings to the active card
    pub async fn save_settings(&self) -> ErrorCode {
        self.execute_simple("SS", None).await
    }

    /// `CE`: clear the controller error state
    pub async fn clear_error(&self) -> ErrorCode {
        self.execute_simple("CE", None).await
    }

    /// `PW`: switch to program `number` on SD card `card` (1 or 2).
    /// Unsaved changes to the current program are discarded.
    pub async fn switch_program(&self, card: u8, number: u16) -> ErrorCode {
        self.execute("PW", Some(&format!("{card},{number}"))).await.error_code
    }

    /// `PR`: read the active SD card and program number
    pub async fn read_program(&self) -> (ErrorCode, Option<(u8, u16)>) {
        let reply = self.execute("PR", None).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match (reply.parse_field::<u8>(1), reply.parse_field::<u16>(2)) {
            (Some(card), Some(number)) => (reply.error_code, Some((card, number))),
            _ => (self.reclassify("PR", ErrorCode::Unknown), None),
        }
    }

    /// `EXW`: write the execution condition number
    pub async fn write_execution_condition(&self, condition: i32) -> ErrorCode {
        self.execute("EXW", Some(&condition.to_string())).await.error_code
    }

    /// `EXR`: read the execution condition number
    pub async fn read_execution_condition(&self) -> (ErrorCode, Option<i32>) {
        let reply = self.execute("EXR", None).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match reply.parse_field::<i32>(1) {
            Some(condition) => (reply.error_code, Some(condition)),
            None => (self.reclassify("EXR", ErrorCode::Unknown), None),
        }
    }

    /// `CW`: rewrite the judgment string of tool `tool`, row `row`.
    /// With no string the tool's latest read result is used.
    pub async fn write_judgment_string(
        &self,
        tool: u16,
        row: u16,
        text: Option<&str>,
    ) -> ErrorCode {
        let args = match text {
            Some(text) => format!("{tool},{row},{text}"),
            None => format!("{tool},{row}"),
        };
        self.execute("CW", Some(&args)).await.error_code
    }

    /// `CR`: read the judgment string of tool `tool`, row `row`
    pub async fn read_judgment_string(
        &self,
        tool: u16,
        row: u16,
    ) -> (ErrorCode, Option<String>) {
        let reply = self.execute("CR", Some(&format!("{tool},{row}"))).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match reply.field(1) {
            Some(text) => {
                let text = text.to_string();
                (reply.error_code, Some(text))
            }
            None => (self.reclassify("CR", ErrorCode::Unknown), None),
        }
    }

    /// `STW`: rewrite external string slot `slot` (0 to 9)
    pub async fn write_external_string(&self, slot: u8, text: &str) -> ErrorCode {
        self.execute("STW", Some(&format!("{slot},{text}"))).await.error_code
    }

    /// `STR`: read external string slot `slot`
    pub async fn read_external_string(&self, slot: u8) -> (ErrorCode, Option<String>) {
        let reply = self.execute("STR", Some(&slot.to_string())).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match reply.field(1) {
            Some(text) => {
                let text = text.to_string();
                (reply.error_code, Some(text))
            }
            None => (self.reclassify("STR", ErrorCode::Unknown), None),
        }
    }

    /// `EC`: echo; the controller returns the sent string unchanged
    pub async fn echo(&self, text: &str) -> (ErrorCode, Option<String>) {
        let reply = self.execute("EC", Some(text)).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match reply.field(1) {
            Some(echoed) => {
                let echoed = echoed.to_string();
                (reply.error_code, Some(echoed))
            }
            None => (self.reclassify("EC", ErrorCode::Unknown), None),
        }
    }

    /// `TW`: set the controller clock
    pub async fn write_time(&self, time: DeviceTime) -> ErrorCode {
        self.execute("TW", Some(&time.to_args())).await.error_code
    }

    /// `TR`: read the controller clock
    pub async fn read_time(&self) -> (ErrorCode, Option<DeviceTime>) {
        let reply = self.execute("TR", None).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match DeviceTime::from_reply(&reply) {
            Some(time) => (reply.error_code, Some(time)),
            None => (self.reclassify("TR", ErrorCode::Unknown), None),
        }
    }

    /// `VI`: read the controller model and ROM version
    pub async fn version_info(&self) -> (ErrorCode, Option<(String, String)>) {
        let reply = self.execute("VI", None).await;
        if !reply.is_success() {
            return (reply.error_code, None);
        }
        match (reply.field(1), reply.field(2)) {
            (Some(model), Some(version)) => {
                let info = (model.to_string(), version.to_string());
                (reply.error_code, Some(info))
            }
            _ => (self.reclassify("VI", ErrorCode::Unknown), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ClientOptions;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn test_client(addr: SocketAddr) -> CvxClient {
        let options = ClientOptions::new(addr.ip(), addr.port())
            .command_timeout(Duration::from_millis(500))
            .connect_timeout(Duration::from_secs(1));
        CvxClient::new(options)
    }

    async fn read_command(stream: &mut TcpStream) -> String {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = stream.read(&mut byte).await.unwrap();
            if n == 0 || byte[0] == b'\r' {
                break;
            }
            line.push(byte[0]);
        }
        String::from_utf8(line).unwrap()
    }

    /// Fake device scripted as (expected command, reply line) pairs.
    async fn scripted_device(script: Vec<(&'static str, &'static str)>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            for (expected, reply) in script {
                assert_eq!(read_command(&mut stream).await, expected);
                stream.write_all(reply.as_bytes()).await.unwrap();
                stream.write_all(b"\r").await.unwrap();
            }
            let _ = read_command(&mut stream).await;
        });
        addr
    }

    #[test]
    fn test_run_mode_from_wire() {
        assert_eq!(RunMode::from_wire(0), Some(RunMode::Setup));
        assert_eq!(RunMode::from_wire(1), Some(RunMode::Run));
        assert_eq!(RunMode::from_wire(2), None);
    }

    #[tokio::test]
    async fn test_trigger_and_mode_wrappers() {
        let addr = scripted_device(vec![
            ("T1", "T1"),
            ("TA", "TA"),
            ("TE,0", "TE"),
            ("TE,1", "TE"),
            ("R0", "R0"),
            ("RM", "RM,1"),
        ])
        .await;
        let client = test_client(addr);
        assert_eq!(client.trigger1().await, ErrorCode::Success);
        assert_eq!(client.trigger_all().await, ErrorCode::Success);
        assert_eq!(client.trigger_enable(true).await, ErrorCode::Success);
        assert_eq!(client.trigger_enable(false).await, ErrorCode::Success);
        assert_eq!(client.to_run_mode().await, ErrorCode::Success);
        assert_eq!(client.run_mode().await, (ErrorCode::Success, Some(RunMode::Run)));
    }

    #[tokio::test]
    async fn test_program_wrappers() {
        let addr = scripted_device(vec![
            ("PW,1,42", "PW"),
            ("PR", "PR,1,42"),
            ("PW,2,1000", "ER,PW,22"),
        ])
        .await;
        let client = test_client(addr);
        assert_eq!(client.switch_program(1, 42).await, ErrorCode::Success);
        assert_eq!(
            client.read_program().await,
            (ErrorCode::Success, Some((1, 42)))
        );
        assert_eq!(
            client.switch_program(2, 1000).await,
            ErrorCode::ArgumentOutOfRange
        );
    }

    #[tokio::test]
    async fn test_malformed_success_reply_reclassifies_unknown() {
        let addr = scripted_device(vec![("RM", "RM,bogus"), ("PR", "PR,1")]).await;
        let client = test_client(addr);

        let (code, mode) = client.run_mode().await;
        assert_eq!(code, ErrorCode::Unknown);
        assert_eq!(mode, None);
        assert_eq!(client.last_error("RM"), Some(ErrorCode::Unknown));

        let (code, program) = client.read_program().await;
        assert_eq!(code, ErrorCode::Unknown);
        assert_eq!(program, None);
        assert_eq!(client.last_error("PR"), Some(ErrorCode::Unknown));
    }

    #[tokio::test]
    async fn test_string_wrappers() {
        let addr = scripted_device(vec![
            ("CW,101,1,ABC", "CW"),
            ("CR,101,1", "CR,ABC"),
            ("STW,3,hello", "STW"),
            ("STR,3", "STR,hello"),
            ("EC,ping", "EC,ping"),
        ])
        .await;
        let client = test_client(addr);
        assert_eq!(
            client.write_judgment_string(101, 1, Some("ABC")).await,
            ErrorCode::Success
        );
        assert_eq!(
            client.read_judgment_string(101, 1).await,
            (ErrorCode::Success, Some("ABC".to_string()))
        );
        assert_eq!(
            client.write_external_string(3, "hello").await,
            ErrorCode::Success
        );
        assert_eq!(
            client.read_external_string(3).await,
            (ErrorCode::Success, Some("hello".to_string()))
        );
        assert_eq!(
            client.echo("ping").await,
            (ErrorCode::Success, Some("ping".to_string()))
        );
    }

    #[tokio::test]
    async fn test_clock_and_version_wrappers() {
        let addr = scripted_device(vec![
            ("TW,2026,8,29,10,30,0", "TW"),
            ("TR", "TR,2026,8,29,10,30,1"),
            ("VI", "VI,CV-X450,0001.0002.0003"),
        ])
        .await;
        let client = test_client(addr);
        let time = DeviceTime {
            year: 2026,
            month: 8,
            day: 29,
            hour: 10,
            minute: 30,
            second: 0,
        };
        assert_eq!(client.write_time(time).await, ErrorCode::Success);

        let (code, read_back) = client.read_time().await;
        assert_eq!(code, ErrorCode::Success);
        assert_eq!(read_back, Some(DeviceTime { second: 1, ..time }));

        let (code, info) = client.version_info().await;
        assert_eq!(code, ErrorCode::Success);
        assert_eq!(
            info,
            Some(("CV-X450".to_string(), "0001.0002.0003".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failed_read_returns_no_value() {
        let addr = scripted_device(vec![("EXR", "ER,EXR,2")]).await;
        let client = test_client(addr);
        let (code, condition) = client.read_execution_condition().await;
        assert_eq!(code, ErrorCode::UnrecognizedCommand);
        assert_eq!(condition, None);
        // the ledger keeps the wire classification, not Unknown
        assert_eq!(client.last_error("EXR"), Some(ErrorCode::UnrecognizedCommand));
    }
}
