use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use himalaya_elite::data::model::fields;

const PEAKS: [(&str, f64, f64); 6] = [
    ("Everest", 8849.0, 0.45),
    ("Lhotse", 8516.0, 0.15),
    ("Cho Oyu", 8188.0, 0.15),
    ("Ama Dablam", 6812.0, 0.15),
    ("Manaslu", 8163.0, 0.05),
    ("Annapurna I", 8091.0, 0.05),
];

const SEASONS: [(&str, f64); 4] = [
    ("Spring", 0.55),
    ("Autumn", 0.35),
    ("Winter", 0.06),
    ("Summer", 0.04),
];

const NATIONS: [&str; 8] = [
    "USA", "UK", "Japan", "France", "Spain", "Nepal", "W Germany", "China",
];

const AGENCIES: [&str; 7] = [
    "Himalayan Guides",
    "Seven Summit Treks",
    "Asian Trekking",
    "Thamserku Trekking",
    "Summit Nepal",
    "Cho Oyu Trekking",
    "",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a, T>(&mut self, weighted: &'a [(T, f64)]) -> &'a T {
        let mut roll = self.next_f64();
        for (item, weight) in weighted {
            if roll < *weight {
                return item;
            }
            roll -= weight;
        }
        &weighted[weighted.len() - 1].0
    }
}

#[derive(Default)]
struct Columns {
    expid: Vec<String>,
    year: Vec<i64>,
    pkname: Vec<String>,
    heightm: Vec<Option<f64>>,
    season: Vec<String>,
    nation: Vec<String>,
    countries: Vec<String>,
    agency: Vec<String>,
    totmembers: Vec<i64>,
    mdeaths: Vec<i64>,
    smtmembers: Vec<Option<i64>>,
    highpoint: Vec<f64>,
    success1: Vec<bool>,
}

impl Columns {
    fn push_expedition(&mut self, rng: &mut SimpleRng, id: usize) {
        let year = 1950 + rng.below(75) as i64;
        let (peak, height) = {
            let weighted: Vec<((&str, f64), f64)> =
                PEAKS.iter().map(|&(p, h, w)| ((p, h), w)).collect();
            *rng.pick(&weighted)
        };
        let season = *rng.pick(&SEASONS);
        let members = 1 + rng.below(14) as i64;

        let success = rng.chance(0.55);
        let highpoint = if success {
            height
        } else {
            (height * (0.55 + 0.4 * rng.next_f64())).round()
        };
        let summits = if success {
            1 + rng.below(members as usize) as i64
        } else {
            0
        };

        let nation = NATIONS[rng.below(NATIONS.len())];
        let countries = if rng.chance(0.2) {
            NATIONS[rng.below(NATIONS.len())].to_string()
        } else {
            String::new()
        };

        let code: String = peak.chars().filter(|c| c.is_alphanumeric()).take(4).collect();
        self.expid.push(format!("{}{:02}-{id:04}", code.to_uppercase(), year % 100));
        self.year.push(year);
        self.pkname.push(peak.to_string());
        // some rows come without a height, like the real register
        self.heightm.push((!rng.chance(0.02)).then_some(height));
        self.season.push(season.to_string());
        self.nation.push(nation.to_string());
        self.countries.push(countries);
        self.agency.push(AGENCIES[rng.below(AGENCIES.len())].to_string());
        self.totmembers.push(members);
        self.mdeaths.push(i64::from(rng.chance(0.05)));
        self.smtmembers.push((year >= 1960).then_some(summits));
        self.highpoint.push(highpoint);
        self.success1.push(success);
    }

    fn into_batch(self) -> Result<RecordBatch> {
        let text = |v: Vec<String>| -> ArrayRef { Arc::new(StringArray::from(v)) };
        let columns: Vec<(&str, ArrayRef)> = vec![
            (fields::EXPEDITION_ID, text(self.expid)),
            (fields::YEAR, Arc::new(Int64Array::from(self.year)) as ArrayRef),
            (fields::PEAK_NAME, text(self.pkname)),
            (fields::PEAK_HEIGHT, Arc::new(Float64Array::from(self.heightm)) as ArrayRef),
            (fields::SEASON, text(self.season)),
            (fields::NATION, text(self.nation)),
            (fields::COUNTRIES, text(self.countries)),
            (fields::AGENCY, text(self.agency)),
            (fields::TOTAL_MEMBERS, Arc::new(Int64Array::from(self.totmembers)) as ArrayRef),
            (fields::MEMBER_DEATHS, Arc::new(Int64Array::from(self.mdeaths)) as ArrayRef),
            (fields::SUMMIT_MEMBERS, Arc::new(Int64Array::from(self.smtmembers)) as ArrayRef),
            (fields::HIGH_POINT, Arc::new(Float64Array::from(self.highpoint)) as ArrayRef),
            (fields::SUCCESS, Arc::new(BooleanArray::from(self.success1)) as ArrayRef),
        ];
        Ok(RecordBatch::try_from_iter(columns)?)
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let count = 2000;

    let mut columns = Columns::default();
    for id in 0..count {
        columns.push_expedition(&mut rng, id);
    }
    let batch = columns.into_batch()?;

    let output_path = "sample_expeditions.parquet";
    let file = std::fs::File::create(output_path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!("Wrote {count} expeditions to {output_path}");
    Ok(())
}
