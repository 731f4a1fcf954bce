//! `ShopService`: the user-facing storefront surface.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use tiendita_store::models::{AuthUser, NewAddress};
use tiendita_store::{
    ShopBackend, StoreError, cart::CartService, catalog::CatalogService, catalog::convert_price,
    checkout::CheckoutOutcome, checkout::CheckoutService, profile::ProfileService,
};

use crate::proto::shop_service_server::ShopService;
use crate::status::to_status;
use crate::{auth, convert, proto};

/// Handler state for [`ShopService`].
#[derive(Clone)]
pub struct ShopApi {
    backend: Arc<dyn ShopBackend>,
}

impl ShopApi {
    /// Create the service over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn ShopBackend>) -> Self {
        Self { backend }
    }

    async fn caller(&self, request: &Request<impl Send>) -> Result<AuthUser, Status> {
        auth::authenticate(self.backend.as_ref(), request.metadata()).await
    }
}

#[tonic::async_trait]
impl ShopService for ShopApi {
    async fn get_products(
        &self,
        request: Request<proto::GetProductsRequest>,
    ) -> Result<Response<proto::GetProductsResponse>, Status> {
        self.caller(&request).await?;
        let req = request.into_inner();

        let category_id = convert::parse_category_filter(&req.category_id)?;
        let catalog = CatalogService::new(self.backend.as_ref());
        let mut products = catalog.products(category_id).await.map_err(to_status)?;

        if !req.currency.is_empty() {
            let currencies = catalog.currencies().await.map_err(to_status)?;
            for product in &mut products {
                product.price =
                    convert_price(product.price, &product.currency_code, &req.currency, &currencies);
                product.currency_code.clone_from(&req.currency);
            }
        }

        Ok(Response::new(proto::GetProductsResponse {
            products: products.into_iter().map(convert::product_to_proto).collect(),
        }))
    }

    async fn get_categories(
        &self,
        request: Request<proto::GetCategoriesRequest>,
    ) -> Result<Response<proto::GetCategoriesResponse>, Status> {
        self.caller(&request).await?;

        let categories = CatalogService::new(self.backend.as_ref())
            .categories()
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::GetCategoriesResponse {
            categories: categories
                .into_iter()
                .map(convert::category_to_proto)
                .collect(),
        }))
    }

    async fn get_currencies(
        &self,
        request: Request<proto::GetCurrenciesRequest>,
    ) -> Result<Response<proto::GetCurrenciesResponse>, Status> {
        self.caller(&request).await?;

        let currencies = CatalogService::new(self.backend.as_ref())
            .currencies()
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::GetCurrenciesResponse {
            currencies: currencies
                .into_iter()
                .map(convert::currency_to_proto)
                .collect(),
        }))
    }

    async fn get_cart_items(
        &self,
        request: Request<proto::GetCartItemsRequest>,
    ) -> Result<Response<proto::GetCartItemsResponse>, Status> {
        let user = self.caller(&request).await?;

        let cart = CartService::new(self.backend.as_ref());
        let items = cart.items(user.id).await.map_err(to_status)?;
        let total = cart.total(user.id).await.map_err(to_status)?;

        Ok(Response::new(proto::GetCartItemsResponse {
            items: items.into_iter().map(convert::cart_item_to_proto).collect(),
            total: total.as_minor(),
        }))
    }

    async fn get_cart_count(
        &self,
        request: Request<proto::GetCartCountRequest>,
    ) -> Result<Response<proto::GetCartCountResponse>, Status> {
        let user = self.caller(&request).await?;

        let count = CartService::new(self.backend.as_ref())
            .count(user.id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::GetCartCountResponse { count }))
    }

    async fn add_to_cart(
        &self,
        request: Request<proto::AddToCartRequest>,
    ) -> Result<Response<proto::AddToCartResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        let product_id = convert::parse_product_id(&req.product_id)?;
        CartService::new(self.backend.as_ref())
            .add_to_cart(user.id, product_id, req.quantity)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::AddToCartResponse {}))
    }

    async fn update_cart_quantity(
        &self,
        request: Request<proto::UpdateCartQuantityRequest>,
    ) -> Result<Response<proto::UpdateCartQuantityResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        // Stricter than the service: removal has its own RPC.
        if req.quantity <= 0 {
            return Err(Status::invalid_argument("quantity must be positive"));
        }

        let product_id = convert::parse_product_id(&req.product_id)?;
        CartService::new(self.backend.as_ref())
            .update_quantity(user.id, product_id, req.quantity)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::UpdateCartQuantityResponse {}))
    }

    async fn remove_from_cart(
        &self,
        request: Request<proto::RemoveFromCartRequest>,
    ) -> Result<Response<proto::RemoveFromCartResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        let product_id = convert::parse_product_id(&req.product_id)?;
        CartService::new(self.backend.as_ref())
            .remove(user.id, product_id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::RemoveFromCartResponse {}))
    }

    async fn checkout(
        &self,
        request: Request<proto::CheckoutRequest>,
    ) -> Result<Response<proto::CheckoutResponse>, Status> {
        let user = self.caller(&request).await?;

        let outcome = CheckoutService::new(self.backend.as_ref())
            .checkout(user.id)
            .await
            .map_err(to_status)?;

        let response = match outcome {
            CheckoutOutcome::Completed { order_id, total } => proto::CheckoutResponse {
                status: proto::CheckoutStatus::Completed as i32,
                order_id: order_id.to_string(),
                total: total.as_minor(),
            },
            CheckoutOutcome::NeedsShippingAddress => proto::CheckoutResponse {
                status: proto::CheckoutStatus::NeedsShippingAddress as i32,
                ..Default::default()
            },
            CheckoutOutcome::NeedsBillingAddress => proto::CheckoutResponse {
                status: proto::CheckoutStatus::NeedsBillingAddress as i32,
                ..Default::default()
            },
        };

        Ok(Response::new(response))
    }

    async fn list_my_orders(
        &self,
        request: Request<proto::ListMyOrdersRequest>,
    ) -> Result<Response<proto::ListMyOrdersResponse>, Status> {
        let user = self.caller(&request).await?;

        let orders = self
            .backend
            .orders_for_user(user.id)
            .await
            .map_err(|e| to_status(StoreError::from(e)))?;

        Ok(Response::new(proto::ListMyOrdersResponse {
            orders: orders.into_iter().map(convert::order_to_proto).collect(),
        }))
    }

    async fn get_profile(
        &self,
        request: Request<proto::GetProfileRequest>,
    ) -> Result<Response<proto::GetProfileResponse>, Status> {
        let user = self.caller(&request).await?;

        let profile = ProfileService::new(self.backend.as_ref())
            .profile(user.id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::GetProfileResponse {
            profile: Some(convert::profile_to_proto(profile)),
        }))
    }

    async fn update_profile(
        &self,
        request: Request<proto::UpdateProfileRequest>,
    ) -> Result<Response<proto::UpdateProfileResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        let patch = convert::profile_patch_from_proto(req)?;
        let profile = ProfileService::new(self.backend.as_ref())
            .update_profile(user.id, patch)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::UpdateProfileResponse {
            profile: Some(convert::profile_to_proto(profile)),
        }))
    }

    async fn list_addresses(
        &self,
        request: Request<proto::ListAddressesRequest>,
    ) -> Result<Response<proto::ListAddressesResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        let kind = convert::address_kind_from_proto(req.kind)?;
        let addresses = ProfileService::new(self.backend.as_ref())
            .addresses(user.id, kind)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::ListAddressesResponse {
            addresses: addresses
                .into_iter()
                .map(convert::address_to_proto)
                .collect(),
        }))
    }

    async fn add_address(
        &self,
        request: Request<proto::AddAddressRequest>,
    ) -> Result<Response<proto::AddAddressResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        let kind = convert::address_kind_from_proto(req.kind)?;
        let line2 = if req.line2.is_empty() {
            None
        } else {
            Some(req.line2)
        };
        let address = ProfileService::new(self.backend.as_ref())
            .add_address(NewAddress {
                user_id: user.id,
                kind,
                name: req.name,
                line1: req.line1,
                line2,
                city: req.city,
                state: req.state,
                postal_code: req.postal_code,
                country: req.country,
                is_default: req.is_default,
            })
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::AddAddressResponse {
            address: Some(convert::address_to_proto(address)),
        }))
    }

    async fn delete_address(
        &self,
        request: Request<proto::DeleteAddressRequest>,
    ) -> Result<Response<proto::DeleteAddressResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        let id = convert::parse_address_id(&req.id)?;
        ProfileService::new(self.backend.as_ref())
            .delete_address(user.id, id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::DeleteAddressResponse {}))
    }

    async fn set_default_address(
        &self,
        request: Request<proto::SetDefaultAddressRequest>,
    ) -> Result<Response<proto::SetDefaultAddressResponse>, Status> {
        let user = self.caller(&request).await?;
        let req = request.into_inner();

        let kind = convert::address_kind_from_proto(req.kind)?;
        let id = convert::parse_address_id(&req.id)?;
        ProfileService::new(self.backend.as_ref())
            .set_default_address(user.id, kind, id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::SetDefaultAddressResponse {}))
    }
}
