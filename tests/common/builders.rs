use std::fs;
use std::path::{Path, PathBuf};

pub const B3_HEADER: &str = "DataReferencia;CodigoInstrumento;AcaoAtualizacao;PrecoNegocio;QuantidadeNegociada;HoraFechamento;CodigoIdentificadorNegocio;TipoSessaoPregao;DataNegocio;CodigoParticipanteComprador;CodigoParticipanteVendedor";

/// One data line in the B3 flat-file layout
#[derive(Debug, Clone)]
pub struct TradeLine {
    pub instrument: String,
    pub price: String,
    pub quantity: String,
    pub closing_time: String,
    pub trade_date: String,
}

impl TradeLine {
    pub fn new(instrument: &str) -> Self {
        Self {
            instrument: instrument.to_string(),
            price: "10,50".to_string(),
            quantity: "100".to_string(),
            closing_time: "100000123".to_string(),
            trade_date: "2024-08-16".to_string(),
        }
    }

    pub fn price(mut self, price: &str) -> Self {
        self.price = price.to_string();
        self
    }

    pub fn quantity(mut self, quantity: &str) -> Self {
        self.quantity = quantity.to_string();
        self
    }

    pub fn closing_time(mut self, closing_time: &str) -> Self {
        self.closing_time = closing_time.to_string();
        self
    }

    pub fn trade_date(mut self, trade_date: &str) -> Self {
        self.trade_date = trade_date.to_string();
        self
    }

    pub fn render(&self) -> String {
        format!(
            "2024-08-16;{};0;{};{};{};10;1;{};1;2",
            self.instrument, self.price, self.quantity, self.closing_time, self.trade_date
        )
    }
}

/// Write a header plus `lines` to `dir/name`, creating parent directories
pub fn write_trade_file(dir: &Path, name: &str, lines: &[TradeLine]) -> PathBuf {
    let body: Vec<String> = lines.iter().map(TradeLine::render).collect();
    write_raw_file(dir, name, &format!("{B3_HEADER}\n{}\n", body.join("\n")))
}

pub fn write_raw_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

pub fn numbered_lines(prefix: &str, count: usize) -> Vec<TradeLine> {
    (0..count)
        .map(|i| TradeLine::new(&format!("{prefix}{i}")))
        .collect()
}
