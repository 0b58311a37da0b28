use newt::link::Link;
use newt::{Client, Config};
use newt_msg::registry;

fn main() {
  simple_logger::SimpleLogger::new().init().unwrap();

  let uri = std::env::args().nth(1)
                            .unwrap_or_else(|| "coap://coap.me/hello".to_string());

  let mut client = Client::new(Config::default());
  match client.get_by_uri(&uri) {
    | Ok(rep) => {
      log::info!("{:?} {:?}: {:?}",
                 rep.ty,
                 rep.code,
                 String::from_utf8_lossy(&rep.payload.0));

      // /.well-known/core answers are lists of links
      if rep.get_uint(registry::CONTENT_FORMAT) == Some(40) {
        match Link::parse_multiple(&String::from_utf8_lossy(&rep.payload.0)) {
          | Ok(links) => {
            for link in links {
              log::info!("  {}", link);
            }
          },
          | Err(e) => log::error!("unparseable link document: {:?}", e),
        }
      }
    },
    | Err(e) => {
      log::error!("request failed: {:?}", e);
    },
  }
}
