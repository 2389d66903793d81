use structopt::StructOpt;

#[derive(StructOpt)]
pub struct Options {
    /// Path of the config file
    #[structopt(long, default_value = "config.toml")]
    pub config: String,

    /// Print the resolvers of every field, including their directive arguments
    #[structopt(long)]
    pub verbose: bool,
}
