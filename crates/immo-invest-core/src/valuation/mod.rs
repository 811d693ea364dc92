pub mod fair_price;
