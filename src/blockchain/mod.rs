pub mod gateway;
pub mod mock;
pub mod models;
pub mod sbor;
pub mod state;
pub mod traits;
pub mod wallet;

pub use gateway::GatewayClient;
pub use mock::{MockGateway, MockWallet, ScriptedReply};
pub use sbor::{DecodedState, FieldKind, SborNode, SborValue, StateSchema};
pub use state::{AccountBalances, StakerInfo, StateReader};
pub use traits::{GatewayApi, TransactionIntent, TransactionRequest, WalletAccount, WalletConnector};
pub use wallet::{classify_wallet_error, extract_error_message, WalletRelay};
