mod generate;
mod info;
