use actix_web::{HttpResponse, get, web};
use log::{debug, info};
use std::time::Instant;

use super::models::{AppState, ChainResponse, MineResponse, ValidateResponse};
use crate::blockchain::Blockchain;
use crate::error::ChainError;

/// Run `f` against the locked chain on the blocking pool, so neither the
/// lock wait nor the proof search ties up an async worker.
async fn with_chain<F, R>(state: web::Data<AppState>, f: F) -> Result<R, ChainError>
where
    F: FnOnce(&AppState, &mut Blockchain) -> Result<R, ChainError> + Send + 'static,
    R: Send + 'static,
{
    web::block(move || {
        let mut bc = state
            .blockchain
            .lock()
            .map_err(|_| ChainError::LockPoisoned)?;
        f(state.get_ref(), &mut *bc)
    })
    .await
    .map_err(|e| ChainError::Blocking(e.to_string()))?
}

/// Mine a new block on top of the current tip.
///
/// The whole read-tip / search / hash / append sequence runs under the
/// chain mutex, so concurrent requests queue up.
#[get("/mine_block")]
pub async fn mine_block(state: web::Data<AppState>) -> Result<HttpResponse, ChainError> {
    let t0 = Instant::now();

    let block = with_chain(state, |state, bc| {
        let block = bc.mine_block_cancellable(&state.shutdown)?.clone();
        debug!("MINER - chain length now {}", bc.len());
        Ok(block)
    })
    .await?;

    info!(
        "MINER - sealed block #{} (proof={}, {} ms)",
        block.index,
        block.proof,
        t0.elapsed().as_millis()
    );

    Ok(HttpResponse::Ok().json(MineResponse {
        message: "Congratulations, you just mined a block!",
        index: block.index,
        timestamp: block.timestamp,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

/// Get the full blockchain.
#[get("/get_chain")]
pub async fn get_chain(state: web::Data<AppState>) -> Result<HttpResponse, ChainError> {
    let chain = with_chain(state, |_, bc| Ok(bc.chain().to_vec())).await?;
    Ok(HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain,
    }))
}

/// Validate the whole chain.
#[get("/is_valid")]
pub async fn is_valid(state: web::Data<AppState>) -> Result<HttpResponse, ChainError> {
    let valid = with_chain(state, |_, bc| Ok(bc.is_valid())).await?;
    let message = if valid {
        "All good. The Blockchain is valid."
    } else {
        "Houston, we have a problem. The Blockchain is not valid."
    };
    Ok(HttpResponse::Ok().json(ValidateResponse { message, valid }))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use futures::future::join_all;
    use serde_json::Value;

    use crate::api::{AppState, init_routes};

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(init_routes)).await
        };
    }

    #[actix_web::test]
    async fn fresh_chain_has_only_genesis() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);

        let req = test::TestRequest::get().uri("/get_chain").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["index"], 1);
        assert_eq!(body["chain"][0]["previous_hash"], "0");
        assert_eq!(body["chain"][0]["proof"], 1);
    }

    #[actix_web::test]
    async fn mine_block_returns_new_block() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);

        let genesis_hash = {
            let bc = state.blockchain.lock().unwrap();
            bc.hash(bc.get_previous_block().unwrap())
        };

        let req = test::TestRequest::get().uri("/mine_block").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Congratulations, you just mined a block!");
        assert_eq!(body["index"], 2);
        assert_eq!(body["proof"], 533);
        assert_eq!(body["previous_hash"], genesis_hash.as_str());
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn mined_chain_reports_valid() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/mine_block").to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::get().uri("/get_chain").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["length"], 4);
        let indices: Vec<u64> = body["chain"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["index"].as_u64().unwrap())
            .collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);

        let req = test::TestRequest::get().uri("/is_valid").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["message"], "All good. The Blockchain is valid.");
    }

    #[actix_web::test]
    async fn unlinked_block_reports_invalid() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);

        state
            .blockchain
            .lock()
            .unwrap()
            .create_block(7, "not-a-hash".into());

        let req = test::TestRequest::get().uri("/is_valid").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], false);
        assert_eq!(
            body["message"],
            "Houston, we have a problem. The Blockchain is not valid."
        );
    }

    #[actix_web::test]
    async fn concurrent_mining_is_serialized() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);
        let n = 4;

        let responses = join_all((0..n).map(|_| {
            let req = test::TestRequest::get().uri("/mine_block").to_request();
            test::call_service(&app, req)
        }))
        .await;
        assert!(responses.iter().all(|r| r.status().is_success()));

        let bc = state.blockchain.lock().unwrap();
        let indices: Vec<u64> = bc.chain().iter().map(|b| b.index).collect();
        assert_eq!(indices, (1..=n as u64 + 1).collect::<Vec<_>>());
        assert!(bc.is_valid());
    }

    #[actix_web::test]
    async fn reads_alongside_mining_succeed() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);

        let uris = ["/mine_block", "/get_chain", "/is_valid", "/mine_block", "/get_chain"];
        let responses = join_all(uris.iter().map(|uri| {
            let req = test::TestRequest::get().uri(uri).to_request();
            test::call_service(&app, req)
        }))
        .await;
        assert!(responses.iter().all(|r| r.status().is_success()));

        let req = test::TestRequest::get().uri("/is_valid").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(state.blockchain.lock().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn mining_after_shutdown_is_refused() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);
        state.begin_shutdown();

        let req = test::TestRequest::get().uri("/mine_block").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.blockchain.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn health_is_up() {
        let state = web::Data::new(AppState::default());
        let app = app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
